mod draft;
mod example;
mod ids;
mod record;
mod scope;

pub use draft::{
    Confidence, Draft, JudgmentDraft, ParseConfidenceError, WritingDraft, MIN_COMPLETION_CHARS,
    REJECTED_SLOTS,
};
pub use example::Example;
pub use ids::{AnnotatorId, AnnotatorIdError, ExampleId, SubmissionId};
pub use record::{AnnotationRecord, CompletionRecord, ProgressRecord};
pub use scope::{Language, ScopeError, SessionScope, TaskType};
