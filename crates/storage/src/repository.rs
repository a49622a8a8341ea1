use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use annotate_core::model::{ExampleId, ProgressRecord, SessionScope, SubmissionId};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A submitted batch: a snapshot of every record in a scope at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub submitted_at: DateTime<Utc>,
    pub annotations: BTreeMap<ExampleId, ProgressRecord>,
}

impl SubmissionRecord {
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.annotations.len()
    }
}

/// Repository contract for per-scope annotation progress.
///
/// A record's `example_id` is its key within the scope; saving overwrites any
/// prior record for that id.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the record for one example, if any was saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load(
        &self,
        scope: &SessionScope,
        example_id: &ExampleId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Persist or overwrite the record for its example id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails; the caller must surface
    /// this, never drop it.
    async fn save(
        &self,
        scope: &SessionScope,
        record: &ProgressRecord,
    ) -> Result<(), StorageError>;

    /// Fetch every record in the scope, keyed by example id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load_all(
        &self,
        scope: &SessionScope,
    ) -> Result<BTreeMap<ExampleId, ProgressRecord>, StorageError>;

    /// Remove every record in the scope. Returns true if anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn clear(&self, scope: &SessionScope) -> Result<bool, StorageError>;

    /// Number of distinct example ids saved in the scope.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn count(&self, scope: &SessionScope) -> Result<usize, StorageError>;
}

/// Repository contract for submitted batches.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Append a submitted batch for the scope.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn append_submission(
        &self,
        scope: &SessionScope,
        submission: &SubmissionRecord,
    ) -> Result<(), StorageError>;

    /// List the scope's submissions, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn list_submissions(
        &self,
        scope: &SessionScope,
    ) -> Result<Vec<SubmissionRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<Mutex<HashMap<(String, ExampleId), ProgressRecord>>>,
    submissions: Arc<Mutex<Vec<(String, SubmissionRecord)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load(
        &self,
        scope: &SessionScope,
        example_id: &ExampleId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(&(scope.storage_key(), example_id.clone()))
            .cloned())
    }

    async fn save(
        &self,
        scope: &SessionScope,
        record: &ProgressRecord,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            (scope.storage_key(), record.example_id().clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn load_all(
        &self,
        scope: &SessionScope,
    ) -> Result<BTreeMap<ExampleId, ProgressRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let key = scope.storage_key();
        Ok(guard
            .iter()
            .filter(|((scope_key, _), _)| *scope_key == key)
            .map(|((_, example_id), record)| (example_id.clone(), record.clone()))
            .collect())
    }

    async fn clear(&self, scope: &SessionScope) -> Result<bool, StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let key = scope.storage_key();
        let before = guard.len();
        guard.retain(|(scope_key, _), _| *scope_key != key);
        Ok(guard.len() != before)
    }

    async fn count(&self, scope: &SessionScope) -> Result<usize, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let key = scope.storage_key();
        Ok(guard.keys().filter(|(scope_key, _)| *scope_key == key).count())
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryRepository {
    async fn append_submission(
        &self,
        scope: &SessionScope,
        submission: &SubmissionRecord,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .submissions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push((scope.storage_key(), submission.clone()));
        Ok(())
    }

    async fn list_submissions(
        &self,
        scope: &SessionScope,
    ) -> Result<Vec<SubmissionRecord>, StorageError> {
        let guard = self
            .submissions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let key = scope.storage_key();
        let mut found: Vec<SubmissionRecord> = guard
            .iter()
            .filter(|(scope_key, _)| *scope_key == key)
            .map(|(_, submission)| submission.clone())
            .collect();
        found.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(found)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let submissions: Arc<dyn SubmissionRepository> = Arc::new(repo);
        Self {
            progress,
            submissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotate_core::model::{Draft, JudgmentDraft, WritingDraft};
    use annotate_core::time::fixed_now;

    fn scope() -> SessionScope {
        SessionScope::parse("a1", "judgment", "English").unwrap()
    }

    fn judgment_record(example_id: &str, idx: usize) -> ProgressRecord {
        let mut draft = JudgmentDraft::default();
        draft.set_chosen_alignment(true);
        ProgressRecord::from_draft(
            &Draft::Judgment(draft),
            ExampleId::new(example_id),
            idx,
            fixed_now(),
        )
    }

    #[tokio::test]
    async fn save_then_load_returns_the_record() {
        let repo = InMemoryRepository::new();
        let record = judgment_record("ex-1", 0);

        repo.save(&scope(), &record).await.unwrap();
        let loaded = repo.load(&scope(), &ExampleId::new("ex-1")).await.unwrap();

        assert_eq!(loaded, Some(record));
    }

    #[tokio::test]
    async fn save_overwrites_prior_record_for_the_same_id() {
        let repo = InMemoryRepository::new();
        repo.save(&scope(), &judgment_record("ex-1", 0)).await.unwrap();

        let mut updated = judgment_record("ex-1", 0);
        updated.touch(fixed_now() + chrono::Duration::seconds(45));
        repo.save(&scope(), &updated).await.unwrap();

        assert_eq!(repo.count(&scope()).await.unwrap(), 1);
        let loaded = repo
            .load(&scope(), &ExampleId::new("ex-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.last_modified(), updated.last_modified());
    }

    #[tokio::test]
    async fn scopes_do_not_leak_into_each_other() {
        let repo = InMemoryRepository::new();
        let other = SessionScope::parse("a2", "judgment", "English").unwrap();

        repo.save(&scope(), &judgment_record("ex-1", 0)).await.unwrap();
        repo.save(&other, &judgment_record("ex-2", 0)).await.unwrap();

        assert_eq!(repo.count(&scope()).await.unwrap(), 1);
        assert!(repo
            .load(&scope(), &ExampleId::new("ex-2"))
            .await
            .unwrap()
            .is_none());

        assert!(repo.clear(&scope()).await.unwrap());
        assert_eq!(repo.count(&other).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn clear_on_empty_scope_reports_nothing_removed() {
        let repo = InMemoryRepository::new();
        assert!(!repo.clear(&scope()).await.unwrap());
    }

    #[tokio::test]
    async fn submissions_list_most_recent_first() {
        let repo = InMemoryRepository::new();
        let writing_scope = SessionScope::parse("a1", "writing", "Thai").unwrap();

        let mut annotations = BTreeMap::new();
        annotations.insert(
            ExampleId::new("w-1"),
            ProgressRecord::from_draft(
                &Draft::Writing(WritingDraft {
                    human_completion: "a completion long enough".into(),
                    ..WritingDraft::default()
                }),
                ExampleId::new("w-1"),
                0,
                fixed_now(),
            ),
        );

        let earlier = SubmissionRecord {
            id: SubmissionId::generate(),
            submitted_at: fixed_now(),
            annotations: annotations.clone(),
        };
        let later = SubmissionRecord {
            id: SubmissionId::generate(),
            submitted_at: fixed_now() + chrono::Duration::minutes(5),
            annotations,
        };

        repo.append_submission(&writing_scope, &earlier).await.unwrap();
        repo.append_submission(&writing_scope, &later).await.unwrap();

        let listed = repo.list_submissions(&writing_scope).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, later.id);
        assert_eq!(listed[0].record_count(), 1);
    }
}
