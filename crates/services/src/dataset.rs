use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use annotate_core::model::{Example, Language, TaskType};

use crate::error::DatasetError;

/// Source of the ordered example list a session runs over.
///
/// Datasets live at `{task_type}/{language}_samples.json` relative to the
/// source root (directory or HTTP base). A missing dataset yields an empty
/// list, mirroring how the platform treats unpublished language/task pairs;
/// the workflow turns that into a user-facing error at session start.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Load every example for the task/language pair, in dataset order.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError` for unreadable or unparseable datasets.
    async fn load_examples(
        &self,
        task_type: TaskType,
        language: Language,
    ) -> Result<Vec<Example>, DatasetError>;
}

fn dataset_filename(language: Language) -> String {
    format!("{language}_samples.json")
}

/// Reads datasets from a local directory tree.
#[derive(Debug, Clone)]
pub struct FileDatasetSource {
    root: PathBuf,
}

impl FileDatasetSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl DatasetSource for FileDatasetSource {
    async fn load_examples(
        &self,
        task_type: TaskType,
        language: Language,
    ) -> Result<Vec<Example>, DatasetError> {
        let path = self
            .root
            .join(task_type.as_str())
            .join(dataset_filename(language));

        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|source| DatasetError::Io { path, source })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Fetches datasets over HTTP from a static hosting base.
#[derive(Clone)]
pub struct HttpDatasetSource {
    client: Client,
    base_url: String,
}

impl HttpDatasetSource {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    async fn load_examples(
        &self,
        task_type: TaskType,
        language: Language,
    ) -> Result<Vec<Example>, DatasetError> {
        let url = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            task_type.as_str(),
            dataset_filename(language)
        );

        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(DatasetError::HttpStatus(response.status()));
        }

        Ok(response.json().await?)
    }
}

/// Fixed datasets handed in directly, for tests and seeding.
#[derive(Clone, Default)]
pub struct InMemoryDatasetSource {
    datasets: Arc<Mutex<HashMap<(TaskType, Language), Vec<Example>>>>,
}

impl InMemoryDatasetSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the dataset for a task/language pair, replacing any prior one.
    pub fn insert(&self, task_type: TaskType, language: Language, examples: Vec<Example>) {
        if let Ok(mut guard) = self.datasets.lock() {
            guard.insert((task_type, language), examples);
        }
    }
}

#[async_trait]
impl DatasetSource for InMemoryDatasetSource {
    async fn load_examples(
        &self,
        task_type: TaskType,
        language: Language,
    ) -> Result<Vec<Example>, DatasetError> {
        let guard = self
            .datasets
            .lock()
            .map_err(|e| DatasetError::Io {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::other(e.to_string()),
            })?;
        Ok(guard
            .get(&(task_type, language))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotate_core::model::ExampleId;

    fn example(id: &str) -> Example {
        Example {
            id: ExampleId::new(id),
            prompt: "p".into(),
            category: String::new(),
            country: String::new(),
            chosen: Vec::new(),
            chosen_model: Vec::new(),
            rejected: Vec::new(),
            rejected_model: Vec::new(),
        }
    }

    #[tokio::test]
    async fn file_source_reads_task_and_language_layout() {
        let dir = tempfile::tempdir().unwrap();
        let judgment_dir = dir.path().join("judgment");
        std::fs::create_dir_all(&judgment_dir).unwrap();
        std::fs::write(
            judgment_dir.join("English_samples.json"),
            serde_json::to_string(&vec![example("ex-1"), example("ex-2")]).unwrap(),
        )
        .unwrap();

        let source = FileDatasetSource::new(dir.path());
        let examples = source
            .load_examples(TaskType::Judgment, Language::English)
            .await
            .unwrap();

        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].id.as_str(), "ex-1");
    }

    #[tokio::test]
    async fn file_source_treats_missing_dataset_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileDatasetSource::new(dir.path());

        let examples = source
            .load_examples(TaskType::Writing, Language::Thai)
            .await
            .unwrap();
        assert!(examples.is_empty());
    }

    #[tokio::test]
    async fn file_source_reports_parse_failures() {
        let dir = tempfile::tempdir().unwrap();
        let writing_dir = dir.path().join("writing");
        std::fs::create_dir_all(&writing_dir).unwrap();
        std::fs::write(writing_dir.join("Thai_samples.json"), "not json").unwrap();

        let source = FileDatasetSource::new(dir.path());
        let err = source
            .load_examples(TaskType::Writing, Language::Thai)
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::Parse(_)));
    }

    #[tokio::test]
    async fn http_source_fetches_and_parses() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::to_string(&vec![example("ex-1")]).unwrap();
        let mock = server
            .mock("GET", "/judgment/English_samples.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let source = HttpDatasetSource::new(server.url());
        let examples = source
            .load_examples(TaskType::Judgment, Language::English)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(examples.len(), 1);
    }

    #[tokio::test]
    async fn http_source_treats_404_as_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/writing/Korean_samples.json")
            .with_status(404)
            .create_async()
            .await;

        let source = HttpDatasetSource::new(server.url());
        let examples = source
            .load_examples(TaskType::Writing, Language::Korean)
            .await
            .unwrap();
        assert!(examples.is_empty());
    }
}
