/// Aggregated view of where a session stands, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based position of the current example.
    pub position: usize,
    pub total: usize,
    pub is_last: bool,
}

impl SessionProgress {
    /// Share of the batch reached so far, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.position as f64 / self.total as f64 * 100.0
    }
}
