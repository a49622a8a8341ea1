use chrono::{DateTime, Utc};
use std::fmt;

use annotate_core::model::{Draft, Example, ExampleId, ProgressRecord, SessionScope};

use super::progress::SessionProgress;
use crate::error::SessionError;

/// In-memory annotation session over an ordered example list.
///
/// This is the explicit session object the views and the workflow pass
/// around: the current index, the editable draft for the current example,
/// and nothing ambient. All transitions here are pure; persistence around
/// them is the workflow's job.
pub struct AnnotationSession {
    scope: SessionScope,
    examples: Vec<Example>,
    example_idx: usize,
    draft: Draft,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl AnnotationSession {
    /// Create a session positioned at `example_idx`.
    ///
    /// An out-of-range start index falls back to 0, matching how stale deep
    /// links behave. `started_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyDataset` if no examples are provided.
    pub fn new(
        scope: SessionScope,
        examples: Vec<Example>,
        example_idx: usize,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if examples.is_empty() {
            return Err(SessionError::EmptyDataset {
                task_type: scope.task_type(),
                language: scope.language(),
            });
        }
        let example_idx = if example_idx < examples.len() {
            example_idx
        } else {
            0
        };
        let draft = Draft::for_task(scope.task_type());

        Ok(Self {
            scope,
            examples,
            example_idx,
            draft,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn total_examples(&self) -> usize {
        self.examples.len()
    }

    #[must_use]
    pub fn example_idx(&self) -> usize {
        self.example_idx
    }

    #[must_use]
    pub fn current_example(&self) -> &Example {
        &self.examples[self.example_idx]
    }

    #[must_use]
    pub fn current_example_id(&self) -> &ExampleId {
        &self.current_example().id
    }

    #[must_use]
    pub fn is_last_example(&self) -> bool {
        self.example_idx + 1 >= self.examples.len()
    }

    #[must_use]
    pub fn is_batch_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    /// Returns a summary of the current session position.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            position: self.example_idx + 1,
            total: self.examples.len(),
            is_last: self.is_last_example(),
        }
    }

    /// Replace the draft with the state a stored record was saved from.
    pub fn restore(&mut self, record: &ProgressRecord) {
        self.draft = record.restore();
    }

    /// Reset the draft to an empty one for the current task.
    pub fn reset_draft(&mut self) {
        self.draft = Draft::for_task(self.scope.task_type());
    }

    /// Step back one example. Returns false (and changes nothing) at index 0.
    pub(crate) fn retreat(&mut self) -> bool {
        if self.example_idx == 0 {
            return false;
        }
        self.example_idx -= 1;
        self.reset_draft();
        true
    }

    /// Step forward one example. Returns false (and changes nothing) on the
    /// last example; completing the batch is the workflow's transition.
    pub(crate) fn advance(&mut self) -> bool {
        if self.is_last_example() {
            return false;
        }
        self.example_idx += 1;
        self.reset_draft();
        true
    }

    pub(crate) fn mark_batch_complete(&mut self, at: DateTime<Utc>) {
        self.completed_at = Some(at);
    }
}

impl fmt::Debug for AnnotationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationSession")
            .field("scope", &self.scope)
            .field("examples_len", &self.examples.len())
            .field("example_idx", &self.example_idx)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}
