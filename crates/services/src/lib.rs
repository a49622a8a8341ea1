#![forbid(unsafe_code)]

pub mod app_services;
pub mod dataset;
pub mod error;
pub mod progress_service;
pub mod sessions;
pub mod sync_service;

pub use annotate_core::Clock;
pub use sessions as session;

pub use error::{AppServicesError, DatasetError, ProgressError, SessionError, SyncError};

pub use app_services::AppServices;
pub use dataset::{DatasetSource, FileDatasetSource, HttpDatasetSource, InMemoryDatasetSource};
pub use progress_service::{ExportArtifact, ProgressService};
pub use sessions::{
    AnnotationSession, SessionAdvance, SessionProgress, SessionWorkflow, SubmissionOutcome,
};
pub use sync_service::{BatchReceipt, RemoteSyncConfig, RemoteSyncService};
