use std::sync::Arc;
use tracing::{debug, warn};

use annotate_core::Clock;
use annotate_core::model::{ProgressRecord, SessionScope, SubmissionId};
use storage::repository::{ProgressRepository, SubmissionRecord, SubmissionRepository};

use super::service::AnnotationSession;
use crate::dataset::DatasetSource;
use crate::error::SessionError;

/// Outcome of asking the workflow to move forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAdvance {
    /// Moved to the next example.
    Moved { example_idx: usize },
    /// The current example is not complete; nothing moved. The labels list
    /// exactly which required fields are still open.
    Incomplete { missing: Vec<&'static str> },
    /// The last example was completed; the session is now terminal and the
    /// export/submit flow takes over.
    BatchComplete { total_saved: usize },
}

/// Result of persisting a submitted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub submission_id: SubmissionId,
    pub annotations_count: usize,
}

/// Orchestrates dataset loading and persistence around session transitions.
///
/// The ordering guarantee lives here: every navigation persists the current
/// draft before the index changes, so nothing is lost on transition.
#[derive(Clone)]
pub struct SessionWorkflow {
    clock: Clock,
    dataset: Arc<dyn DatasetSource>,
    progress: Arc<dyn ProgressRepository>,
    submissions: Arc<dyn SubmissionRepository>,
}

impl SessionWorkflow {
    #[must_use]
    pub fn new(
        clock: Clock,
        dataset: Arc<dyn DatasetSource>,
        progress: Arc<dyn ProgressRepository>,
        submissions: Arc<dyn SubmissionRepository>,
    ) -> Self {
        Self {
            clock,
            dataset,
            progress,
            submissions,
        }
    }

    /// Start (or resume) a session for the scope at the given example index.
    ///
    /// Any record previously saved for the entry example is restored into
    /// the draft so the UI can re-derive its indicators.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyDataset` when the dataset has no examples,
    /// and dataset/storage errors otherwise.
    pub async fn start_session(
        &self,
        scope: SessionScope,
        example_idx: usize,
    ) -> Result<AnnotationSession, SessionError> {
        let examples = self
            .dataset
            .load_examples(scope.task_type(), scope.language())
            .await?;
        let mut session =
            AnnotationSession::new(scope, examples, example_idx, self.clock.now())?;
        self.restore_current(&mut session).await?;
        debug!(
            scope = %session.scope().storage_key(),
            example_idx = session.example_idx(),
            total = session.total_examples(),
            "annotation session started"
        );
        Ok(session)
    }

    /// Persist the current draft unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the write fails; the caller
    /// surfaces this to the annotator.
    pub async fn save_current(
        &self,
        session: &AnnotationSession,
    ) -> Result<ProgressRecord, SessionError> {
        let record = ProgressRecord::from_draft(
            session.draft(),
            session.current_example_id().clone(),
            session.example_idx(),
            self.clock.now(),
        );
        self.progress.save(session.scope(), &record).await?;
        Ok(record)
    }

    /// Periodic autosave: persists only when the draft has any content, so an
    /// untouched example never produces a record.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the write fails.
    pub async fn autosave_current(
        &self,
        session: &AnnotationSession,
    ) -> Result<Option<ProgressRecord>, SessionError> {
        if session.draft().is_untouched() {
            return Ok(None);
        }
        let record = self.save_current(session).await?;
        Ok(Some(record))
    }

    /// Step back one example, persisting the current draft first.
    ///
    /// Returns false at index 0 and changes nothing, without saving.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` for persistence failures.
    pub async fn previous(&self, session: &mut AnnotationSession) -> Result<bool, SessionError> {
        if session.example_idx() == 0 {
            return Ok(false);
        }

        self.save_current(session).await?;
        session.retreat();
        self.restore_current(session).await?;
        Ok(true)
    }

    /// Step forward one example, gated on completeness.
    ///
    /// An incomplete draft yields `SessionAdvance::Incomplete` and does not
    /// move the index; the listing is expected user feedback, not a fault.
    /// On the last example a complete draft persists and transitions the
    /// session into its terminal batch-complete state instead of advancing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` for persistence failures.
    pub async fn next(
        &self,
        session: &mut AnnotationSession,
    ) -> Result<SessionAdvance, SessionError> {
        let missing = session.draft().missing_fields();
        if !missing.is_empty() {
            return Ok(SessionAdvance::Incomplete { missing });
        }

        self.save_current(session).await?;

        if session.advance() {
            self.restore_current(session).await?;
            return Ok(SessionAdvance::Moved {
                example_idx: session.example_idx(),
            });
        }

        session.mark_batch_complete(self.clock.now());
        let total_saved = self.progress.count(session.scope()).await?;
        debug!(
            scope = %session.scope().storage_key(),
            total_saved,
            "annotation batch complete"
        );
        Ok(SessionAdvance::BatchComplete { total_saved })
    }

    /// Snapshot the scope's full record map into a submission.
    ///
    /// Local progress stays intact after submission; clearing the store is a
    /// separate, explicit operation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` for persistence failures.
    pub async fn submit_batch(
        &self,
        scope: &SessionScope,
    ) -> Result<SubmissionOutcome, SessionError> {
        let annotations = self.progress.load_all(scope).await?;
        let submission = SubmissionRecord {
            id: SubmissionId::generate(),
            submitted_at: self.clock.now(),
            annotations,
        };
        if let Err(err) = self.submissions.append_submission(scope, &submission).await {
            warn!(scope = %scope.storage_key(), error = %err, "batch submission failed");
            return Err(err.into());
        }

        Ok(SubmissionOutcome {
            submission_id: submission.id,
            annotations_count: submission.record_count(),
        })
    }

    async fn restore_current(&self, session: &mut AnnotationSession) -> Result<(), SessionError> {
        let saved = self
            .progress
            .load(session.scope(), session.current_example_id())
            .await?;
        match saved {
            Some(record) => session.restore(&record),
            None => session.reset_draft(),
        }
        Ok(())
    }
}
