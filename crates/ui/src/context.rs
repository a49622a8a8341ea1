use std::path::PathBuf;
use std::sync::Arc;

use services::{ProgressService, RemoteSyncService, SessionWorkflow};

/// What the composition root (e.g. `crates/app`) must provide to the views.
pub trait UiApp: Send + Sync {
    fn workflow(&self) -> Arc<SessionWorkflow>;
    fn progress(&self) -> Arc<ProgressService>;
    fn sync(&self) -> Arc<RemoteSyncService>;

    /// Directory export artifacts are written into.
    fn export_dir(&self) -> PathBuf;
}

#[derive(Clone)]
pub struct AppContext {
    workflow: Arc<SessionWorkflow>,
    progress: Arc<ProgressService>,
    sync: Arc<RemoteSyncService>,
    export_dir: PathBuf,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            workflow: app.workflow(),
            progress: app.progress(),
            sync: app.sync(),
            export_dir: app.export_dir(),
        }
    }

    #[must_use]
    pub fn workflow(&self) -> Arc<SessionWorkflow> {
        Arc::clone(&self.workflow)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn sync(&self) -> Arc<RemoteSyncService> {
        Arc::clone(&self.sync)
    }

    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone()
    }
}

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
