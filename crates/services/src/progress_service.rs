use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use annotate_core::Clock;
use annotate_core::model::{Draft, ExampleId, ProgressRecord, SessionScope, TaskType};
use storage::repository::ProgressRepository;

use crate::error::ProgressError;

/// A serialized export ready for a client-side file save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub record_count: usize,
    pub data: serde_json::Value,
}

/// Progress store facade: builds records from drafts, stamps `last_modified`,
/// and assembles export artifacts.
///
/// The repository behind it is pluggable; nothing here depends on which
/// backend the app was assembled with.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, progress }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(clock, Arc::new(storage::repository::InMemoryRepository::new()))
    }

    /// Snapshot a draft into its record and persist it, overwriting any prior
    /// record for the example.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the write fails. The failure is
    /// reported, never swallowed; callers surface it to the annotator.
    pub async fn save_draft(
        &self,
        scope: &SessionScope,
        draft: &Draft,
        example_id: ExampleId,
        example_idx: usize,
    ) -> Result<ProgressRecord, ProgressError> {
        let record =
            ProgressRecord::from_draft(draft, example_id, example_idx, self.clock.now());
        self.progress.save(scope, &record).await?;
        debug!(
            example_id = %record.example_id(),
            example_idx,
            "saved annotation progress"
        );
        Ok(record)
    }

    /// Fetch the saved record for one example, if any.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn load(
        &self,
        scope: &SessionScope,
        example_id: &ExampleId,
    ) -> Result<Option<ProgressRecord>, ProgressError> {
        Ok(self.progress.load(scope, example_id).await?)
    }

    /// Fetch every record in the scope, keyed by example id.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn load_all(
        &self,
        scope: &SessionScope,
    ) -> Result<BTreeMap<ExampleId, ProgressRecord>, ProgressError> {
        Ok(self.progress.load_all(scope).await?)
    }

    /// Number of distinct examples with a saved record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn count(&self, scope: &SessionScope) -> Result<usize, ProgressError> {
        Ok(self.progress.count(scope).await?)
    }

    /// Remove every record in the scope. Returns true if anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the delete fails.
    pub async fn clear(&self, scope: &SessionScope) -> Result<bool, ProgressError> {
        Ok(self.progress.clear(scope).await?)
    }

    /// Assemble the downloadable artifact for the scope's full record map.
    ///
    /// Repeated exports are equivalent apart from `export_timestamp`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn export_for_download(
        &self,
        scope: &SessionScope,
    ) -> Result<ExportArtifact, ProgressError> {
        let annotations = self.progress.load_all(scope).await?;
        let exported_at = self.clock.now();
        let record_count = annotations.len();

        // Judgment exports speak of annotations, writing exports of
        // completions; both shapes are otherwise identical.
        let records_key = match scope.task_type() {
            TaskType::Judgment => "annotations",
            TaskType::Writing => "completions",
        };
        let data = json!({
            "annotator_id": scope.annotator_id().as_str(),
            "task_type": scope.task_type().as_str(),
            "language": scope.language().as_str(),
            "export_timestamp": exported_at.to_rfc3339(),
            format!("total_{records_key}"): record_count,
            records_key: annotations,
            "metadata": {
                "storage_type": "workbench_local_store",
                "note": "All data stored on this machine. Keep a copy of this file!",
            },
        });

        Ok(ExportArtifact {
            filename: scope.export_filename(exported_at),
            record_count,
            data,
        })
    }
}
