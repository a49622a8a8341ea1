use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::draft::{Confidence, Draft, JudgmentDraft, WritingDraft};
use crate::model::ids::ExampleId;

/// Persisted judgment annotation for one example.
///
/// Autosave may persist a partially answered example, so the judgment fields
/// stay optional here; completeness is decided on the draft, not the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_alignment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_misalignment_0: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_misalignment_1: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_misalignment_2: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub annotation_time_seconds: u32,
    pub timestamp: DateTime<Utc>,
    pub example_id: ExampleId,
    pub example_idx: usize,
    pub last_modified: DateTime<Utc>,
}

impl AnnotationRecord {
    /// Snapshot of a draft, stamped with save metadata.
    #[must_use]
    pub fn from_draft(
        draft: &JudgmentDraft,
        example_id: ExampleId,
        example_idx: usize,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            chosen_alignment: draft.chosen_alignment,
            rejected_misalignment_0: draft.rejected_misalignment[0],
            rejected_misalignment_1: draft.rejected_misalignment[1],
            rejected_misalignment_2: draft.rejected_misalignment[2],
            confidence: draft.confidence,
            notes: draft.notes.clone(),
            annotation_time_seconds: draft.annotation_time_seconds,
            timestamp: saved_at,
            example_id,
            example_idx,
            last_modified: saved_at,
        }
    }

    /// Rebuilds the editable draft this record was saved from.
    #[must_use]
    pub fn restore(&self) -> JudgmentDraft {
        JudgmentDraft {
            chosen_alignment: self.chosen_alignment,
            rejected_misalignment: [
                self.rejected_misalignment_0,
                self.rejected_misalignment_1,
                self.rejected_misalignment_2,
            ],
            confidence: self.confidence,
            notes: self.notes.clone(),
            annotation_time_seconds: self.annotation_time_seconds,
        }
    }
}

/// Persisted written completion for one example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub human_completion: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub annotation_time_seconds: u32,
    pub timestamp: DateTime<Utc>,
    pub example_id: ExampleId,
    pub example_idx: usize,
    pub last_modified: DateTime<Utc>,
}

impl CompletionRecord {
    #[must_use]
    pub fn from_draft(
        draft: &WritingDraft,
        example_id: ExampleId,
        example_idx: usize,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            human_completion: draft.human_completion.clone(),
            notes: draft.notes.clone(),
            annotation_time_seconds: draft.annotation_time_seconds,
            timestamp: saved_at,
            example_id,
            example_idx,
            last_modified: saved_at,
        }
    }

    #[must_use]
    pub fn restore(&self) -> WritingDraft {
        WritingDraft {
            human_completion: self.human_completion.clone(),
            notes: self.notes.clone(),
            annotation_time_seconds: self.annotation_time_seconds,
        }
    }
}

/// Either record shape, as stored in a progress store.
///
/// Untagged on the wire to match the dataset export format. The `Writing`
/// variant must stay first: completion records are the only ones carrying
/// `human_completion`, while every judgment field is optional and would
/// otherwise swallow a completion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressRecord {
    Writing(CompletionRecord),
    Judgment(AnnotationRecord),
}

impl ProgressRecord {
    #[must_use]
    pub fn example_id(&self) -> &ExampleId {
        match self {
            ProgressRecord::Writing(record) => &record.example_id,
            ProgressRecord::Judgment(record) => &record.example_id,
        }
    }

    #[must_use]
    pub fn example_idx(&self) -> usize {
        match self {
            ProgressRecord::Writing(record) => record.example_idx,
            ProgressRecord::Judgment(record) => record.example_idx,
        }
    }

    #[must_use]
    pub fn last_modified(&self) -> DateTime<Utc> {
        match self {
            ProgressRecord::Writing(record) => record.last_modified,
            ProgressRecord::Judgment(record) => record.last_modified,
        }
    }

    /// Stamps a new `last_modified`, leaving everything else untouched.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        match self {
            ProgressRecord::Writing(record) => record.last_modified = at,
            ProgressRecord::Judgment(record) => record.last_modified = at,
        }
    }

    /// Builds the record for a draft, stamping save metadata.
    #[must_use]
    pub fn from_draft(
        draft: &Draft,
        example_id: ExampleId,
        example_idx: usize,
        saved_at: DateTime<Utc>,
    ) -> Self {
        match draft {
            Draft::Judgment(draft) => ProgressRecord::Judgment(AnnotationRecord::from_draft(
                draft, example_id, example_idx, saved_at,
            )),
            Draft::Writing(draft) => ProgressRecord::Writing(CompletionRecord::from_draft(
                draft, example_id, example_idx, saved_at,
            )),
        }
    }

    /// Rebuilds the editable draft this record was saved from.
    #[must_use]
    pub fn restore(&self) -> Draft {
        match self {
            ProgressRecord::Writing(record) => Draft::Writing(record.restore()),
            ProgressRecord::Judgment(record) => Draft::Judgment(record.restore()),
        }
    }
}
