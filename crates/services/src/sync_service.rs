use std::collections::BTreeMap;
use std::env;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use annotate_core::model::{ExampleId, ProgressRecord, SessionScope};

use crate::error::SyncError;

/// Remote collection endpoint configuration.
///
/// The local store is authoritative either way; a configured sync target only
/// mirrors progress and receives batch submissions.
#[derive(Clone, Debug)]
pub struct RemoteSyncConfig {
    pub base_url: String,
}

impl RemoteSyncConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("ANNOTATE_SYNC_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self { base_url })
    }
}

/// Receipt returned by the collection server for a submitted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReceipt {
    pub annotations_count: usize,
    pub output_file: String,
}

/// Client for the optional collection server.
#[derive(Clone)]
pub struct RemoteSyncService {
    client: Client,
    config: Option<RemoteSyncConfig>,
}

impl RemoteSyncService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(RemoteSyncConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<RemoteSyncConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Mirror the scope's record map to the collection server.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` when the service is disabled, the request fails,
    /// or the server rejects the payload.
    pub async fn push_progress(
        &self,
        scope: &SessionScope,
        annotations: &BTreeMap<ExampleId, ProgressRecord>,
    ) -> Result<(), SyncError> {
        let config = self.config.as_ref().ok_or(SyncError::Disabled)?;

        let url = format!(
            "{}/api/save_progress",
            config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .json(&ScopedAnnotations::new(scope, annotations))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::HttpStatus(response.status()));
        }

        let body: StatusResponse = response.json().await?;
        body.ensure_success()?;
        debug!(scope = %scope.storage_key(), count = annotations.len(), "progress pushed");
        Ok(())
    }

    /// Submit the scope's full annotation set to the collection server.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` when the service is disabled, the request fails,
    /// or the server rejects the batch. Local progress is untouched either
    /// way, so the annotator can retry.
    pub async fn submit_batch(
        &self,
        scope: &SessionScope,
        annotations: &BTreeMap<ExampleId, ProgressRecord>,
    ) -> Result<BatchReceipt, SyncError> {
        let config = self.config.as_ref().ok_or(SyncError::Disabled)?;

        let url = format!(
            "{}/api/submit_batch",
            config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .json(&ScopedAnnotations::new(scope, annotations))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::HttpStatus(response.status()));
        }

        let body: SubmitBatchResponse = response.json().await?;
        body.status.ensure_success()?;
        Ok(BatchReceipt {
            annotations_count: body.annotations_count,
            output_file: body.output_file,
        })
    }
}

#[derive(Debug, Serialize)]
struct ScopedAnnotations<'a> {
    annotator_id: &'a str,
    task_type: &'a str,
    language: &'a str,
    annotations: &'a BTreeMap<ExampleId, ProgressRecord>,
}

impl<'a> ScopedAnnotations<'a> {
    fn new(
        scope: &'a SessionScope,
        annotations: &'a BTreeMap<ExampleId, ProgressRecord>,
    ) -> Self {
        Self {
            annotator_id: scope.annotator_id().as_str(),
            task_type: scope.task_type().as_str(),
            language: scope.language().as_str(),
            annotations,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

impl StatusResponse {
    fn ensure_success(&self) -> Result<(), SyncError> {
        if self.status == "success" {
            return Ok(());
        }
        Err(SyncError::Rejected(
            self.message
                .clone()
                .unwrap_or_else(|| self.status.clone()),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct SubmitBatchResponse {
    #[serde(flatten)]
    status: StatusResponse,
    #[serde(default)]
    annotations_count: usize,
    #[serde(default)]
    output_file: String,
}
