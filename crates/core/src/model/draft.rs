use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::scope::TaskType;

/// Minimum trimmed length for a written completion to count as complete.
pub const MIN_COMPLETION_CHARS: usize = 20;

/// Number of rejected-completion slots in a judgment example.
pub const REJECTED_SLOTS: usize = 3;

const REJECTED_LABELS: [&str; REJECTED_SLOTS] = [
    "Rejected #1 judgment",
    "Rejected #2 judgment",
    "Rejected #3 judgment",
];

/// Error type for parsing a confidence level from its wire name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConfidenceError {
    raw: String,
}

impl fmt::Display for ParseConfidenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown confidence level: {}", self.raw)
    }
}

impl std::error::Error for ParseConfidenceError {}

/// Annotator's confidence in their judgments for one example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub const ALL: [Confidence; 3] = [Confidence::Low, Confidence::Medium, Confidence::High];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = ParseConfidenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(ParseConfidenceError {
                raw: other.to_string(),
            }),
        }
    }
}

/// In-memory editable state for one judgment example.
///
/// Fields stay `None` until the annotator answers them; completeness is a
/// pure function of this state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgmentDraft {
    pub chosen_alignment: Option<bool>,
    pub rejected_misalignment: [Option<bool>; REJECTED_SLOTS],
    pub confidence: Option<Confidence>,
    pub notes: String,
    pub annotation_time_seconds: u32,
}

impl JudgmentDraft {
    pub fn set_chosen_alignment(&mut self, value: bool) {
        self.chosen_alignment = Some(value);
    }

    /// Records a judgment for a rejected slot. Returns false when the slot
    /// index is out of range.
    pub fn set_rejected_misalignment(&mut self, slot: usize, value: bool) -> bool {
        match self.rejected_misalignment.get_mut(slot) {
            Some(entry) => {
                *entry = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn set_confidence(&mut self, level: Confidence) {
        self.confidence = Some(level);
    }

    /// Complete iff all four judgments are answered and a confidence is set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.chosen_alignment.is_some()
            && self.rejected_misalignment.iter().all(Option::is_some)
            && self.confidence.is_some()
    }

    /// Human-readable labels of the still-unanswered required fields.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.chosen_alignment.is_none() {
            missing.push("Chosen completion judgment");
        }
        for (slot, answer) in self.rejected_misalignment.iter().enumerate() {
            if answer.is_none() {
                missing.push(REJECTED_LABELS[slot]);
            }
        }
        if self.confidence.is_none() {
            missing.push("Confidence level");
        }
        missing
    }

    /// True when nothing worth autosaving has been entered yet.
    #[must_use]
    pub fn is_untouched(&self) -> bool {
        self.chosen_alignment.is_none()
            && self.rejected_misalignment.iter().all(Option::is_none)
            && self.confidence.is_none()
            && self.notes.trim().is_empty()
    }
}

/// In-memory editable state for one writing example.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WritingDraft {
    pub human_completion: String,
    pub notes: String,
    pub annotation_time_seconds: u32,
}

impl WritingDraft {
    /// Trimmed length of the completion text.
    #[must_use]
    pub fn chars_written(&self) -> usize {
        self.human_completion.trim().chars().count()
    }

    /// Characters still needed to reach the completeness minimum.
    #[must_use]
    pub fn chars_remaining(&self) -> usize {
        MIN_COMPLETION_CHARS.saturating_sub(self.chars_written())
    }

    /// Complete iff the trimmed completion has at least
    /// [`MIN_COMPLETION_CHARS`] characters.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.chars_written() >= MIN_COMPLETION_CHARS
    }

    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        if self.is_complete() {
            Vec::new()
        } else {
            vec!["Written completion (at least 20 characters)"]
        }
    }

    #[must_use]
    pub fn is_untouched(&self) -> bool {
        self.human_completion.trim().is_empty() && self.notes.trim().is_empty()
    }
}

/// Draft for whichever task the session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Judgment(JudgmentDraft),
    Writing(WritingDraft),
}

impl Draft {
    /// Fresh empty draft for the given task.
    #[must_use]
    pub fn for_task(task_type: TaskType) -> Self {
        match task_type {
            TaskType::Judgment => Draft::Judgment(JudgmentDraft::default()),
            TaskType::Writing => Draft::Writing(WritingDraft::default()),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self {
            Draft::Judgment(draft) => draft.is_complete(),
            Draft::Writing(draft) => draft.is_complete(),
        }
    }

    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        match self {
            Draft::Judgment(draft) => draft.missing_fields(),
            Draft::Writing(draft) => draft.missing_fields(),
        }
    }

    #[must_use]
    pub fn is_untouched(&self) -> bool {
        match self {
            Draft::Judgment(draft) => draft.is_untouched(),
            Draft::Writing(draft) => draft.is_untouched(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_judgment() -> JudgmentDraft {
        let mut draft = JudgmentDraft::default();
        draft.set_chosen_alignment(true);
        for slot in 0..REJECTED_SLOTS {
            draft.set_rejected_misalignment(slot, false);
        }
        draft.set_confidence(Confidence::High);
        draft
    }

    #[test]
    fn judgment_incomplete_while_any_field_unset() {
        let mut draft = JudgmentDraft::default();
        assert!(!draft.is_complete());

        draft.set_chosen_alignment(true);
        draft.set_rejected_misalignment(0, false);
        draft.set_rejected_misalignment(1, true);
        assert!(!draft.is_complete());
        assert_eq!(
            draft.missing_fields(),
            vec!["Rejected #3 judgment", "Confidence level"]
        );

        draft.set_rejected_misalignment(2, false);
        assert!(!draft.is_complete());

        draft.set_confidence(Confidence::Medium);
        assert!(draft.is_complete());
        assert!(draft.missing_fields().is_empty());
    }

    #[test]
    fn judgment_complete_requires_confidence() {
        let mut draft = complete_judgment();
        draft.confidence = None;
        assert!(!draft.is_complete());
        assert_eq!(draft.missing_fields(), vec!["Confidence level"]);
    }

    #[test]
    fn rejected_slot_out_of_range_is_reported() {
        let mut draft = JudgmentDraft::default();
        assert!(!draft.set_rejected_misalignment(REJECTED_SLOTS, true));
        assert!(draft.is_untouched());
    }

    #[test]
    fn writing_completeness_boundary_is_twenty_chars() {
        let mut draft = WritingDraft::default();

        draft.human_completion = "a".repeat(19);
        assert!(!draft.is_complete());
        assert_eq!(draft.chars_remaining(), 1);

        draft.human_completion = "a".repeat(20);
        assert!(draft.is_complete());
        assert_eq!(draft.chars_remaining(), 0);
    }

    #[test]
    fn writing_completeness_ignores_surrounding_whitespace() {
        let draft = WritingDraft {
            human_completion: format!("   {}   ", "a".repeat(19)),
            ..WritingDraft::default()
        };
        assert!(!draft.is_complete());
        assert_eq!(draft.chars_written(), 19);
    }

    #[test]
    fn untouched_judgment_with_notes_counts_as_touched() {
        let draft = JudgmentDraft {
            notes: "half-done".into(),
            ..JudgmentDraft::default()
        };
        assert!(!draft.is_untouched());
    }

    #[test]
    fn confidence_parses_wire_names() {
        assert_eq!("high".parse::<Confidence>().unwrap(), Confidence::High);
        assert!("very high".parse::<Confidence>().is_err());
    }
}
