//! Shared error types for the services crate.

use std::path::PathBuf;
use thiserror::Error;

use annotate_core::model::{Language, TaskType};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors loading a dataset file or endpoint.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DatasetError {
    #[error("dataset file {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("dataset request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the session workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no examples found for {language} in {task_type} task")]
    EmptyDataset {
        task_type: TaskType,
        language: Language,
    },

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `RemoteSyncService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("remote sync is not configured")]
    Disabled,

    #[error("sync endpoint reported failure: {0}")]
    Rejected(String),

    #[error("sync request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
