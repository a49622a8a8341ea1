mod progress;
mod service;
mod workflow;

pub use progress::SessionProgress;
pub use service::AnnotationSession;
pub use workflow::{SessionAdvance, SessionWorkflow, SubmissionOutcome};
