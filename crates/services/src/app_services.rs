use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::dataset::DatasetSource;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::sessions::SessionWorkflow;
use crate::sync_service::RemoteSyncService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    workflow: Arc<SessionWorkflow>,
    progress: Arc<ProgressService>,
    sync: Arc<RemoteSyncService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        dataset: Arc<dyn DatasetSource>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, dataset))
    }

    /// Build services over an already-assembled storage backend.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        dataset: Arc<dyn DatasetSource>,
    ) -> Self {
        let workflow = Arc::new(SessionWorkflow::new(
            clock,
            dataset,
            Arc::clone(&storage.progress),
            Arc::clone(&storage.submissions),
        ));
        let progress = Arc::new(ProgressService::new(clock, Arc::clone(&storage.progress)));
        let sync = Arc::new(RemoteSyncService::from_env());

        Self {
            workflow,
            progress,
            sync,
        }
    }

    #[must_use]
    pub fn with_sync(mut self, sync: RemoteSyncService) -> Self {
        self.sync = Arc::new(sync);
        self
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
}
