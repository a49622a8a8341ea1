use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{AnnotatorId, AnnotatorIdError};
use crate::time::date_stamp;

/// The two annotation tasks the workbench supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Judgment,
    Writing,
}

impl TaskType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Judgment => "judgment",
            TaskType::Writing => "writing",
        }
    }

    /// Filename prefix for export artifacts of this task.
    #[must_use]
    pub fn export_prefix(self) -> &'static str {
        match self {
            TaskType::Judgment => "annotations",
            TaskType::Writing => "completions",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "judgment" => Ok(TaskType::Judgment),
            "writing" => Ok(TaskType::Writing),
            other => Err(ScopeError::UnknownTask(other.to_string())),
        }
    }
}

/// The fixed language set the datasets are published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Arabic,
    Chinese,
    English,
    German,
    Japanese,
    Korean,
    Russian,
    Spanish,
    Thai,
    Vietnamese,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Language::Arabic,
        Language::Chinese,
        Language::English,
        Language::German,
        Language::Japanese,
        Language::Korean,
        Language::Russian,
        Language::Spanish,
        Language::Thai,
        Language::Vietnamese,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Arabic => "Arabic",
            Language::Chinese => "Chinese",
            Language::English => "English",
            Language::German => "German",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::Russian => "Russian",
            Language::Spanish => "Spanish",
            Language::Thai => "Thai",
            Language::Vietnamese => "Vietnamese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| ScopeError::UnknownLanguage(s.to_string()))
    }
}

/// Errors building a session scope from raw form or URL input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScopeError {
    #[error(transparent)]
    Annotator(#[from] AnnotatorIdError),

    #[error("unknown task type: {0}")]
    UnknownTask(String),

    #[error("unknown language: {0}")]
    UnknownLanguage(String),
}

/// The (annotator, task, language) triple every progress store is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionScope {
    annotator_id: AnnotatorId,
    task_type: TaskType,
    language: Language,
}

impl SessionScope {
    #[must_use]
    pub fn new(annotator_id: AnnotatorId, task_type: TaskType, language: Language) -> Self {
        Self {
            annotator_id,
            task_type,
            language,
        }
    }

    /// Builds a scope from raw string input (entry form, URL parameters).
    ///
    /// # Errors
    ///
    /// Returns `ScopeError` if the annotator id is blank or the task/language
    /// is not one of the known values.
    pub fn parse(annotator_id: &str, task_type: &str, language: &str) -> Result<Self, ScopeError> {
        Ok(Self {
            annotator_id: AnnotatorId::new(annotator_id)?,
            task_type: task_type.parse()?,
            language: language.parse()?,
        })
    }

    #[must_use]
    pub fn annotator_id(&self) -> &AnnotatorId {
        &self.annotator_id
    }

    #[must_use]
    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Key under which this scope's records live, unique per triple.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.annotator_id, self.task_type, self.language
        )
    }

    /// Filename for an export artifact produced at `exported_at`.
    #[must_use]
    pub fn export_filename(&self, exported_at: DateTime<Utc>) -> String {
        format!(
            "{}_{}_{}_{}_{}.json",
            self.task_type.export_prefix(),
            self.annotator_id,
            self.task_type,
            self.language,
            date_stamp(exported_at)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn scope() -> SessionScope {
        SessionScope::parse("a1", "judgment", "English").unwrap()
    }

    #[test]
    fn parse_builds_scope_from_raw_strings() {
        let scope = scope();
        assert_eq!(scope.annotator_id().as_str(), "a1");
        assert_eq!(scope.task_type(), TaskType::Judgment);
        assert_eq!(scope.language(), Language::English);
    }

    #[test]
    fn parse_rejects_unknown_language() {
        let err = SessionScope::parse("a1", "judgment", "Klingon").unwrap_err();
        assert!(matches!(err, ScopeError::UnknownLanguage(_)));
    }

    #[test]
    fn parse_rejects_blank_annotator() {
        let err = SessionScope::parse("  ", "writing", "Thai").unwrap_err();
        assert!(matches!(err, ScopeError::Annotator(_)));
    }

    #[test]
    fn storage_key_is_unique_per_triple() {
        assert_eq!(scope().storage_key(), "a1_judgment_English");
        let other = SessionScope::parse("a1", "writing", "English").unwrap();
        assert_ne!(scope().storage_key(), other.storage_key());
    }

    #[test]
    fn export_filename_carries_scope_and_date() {
        assert_eq!(
            scope().export_filename(fixed_now()),
            "annotations_a1_judgment_English_2024-06-01.json"
        );
        let writing = SessionScope::parse("a1", "writing", "Thai").unwrap();
        assert_eq!(
            writing.export_filename(fixed_now()),
            "completions_a1_writing_Thai_2024-06-01.json"
        );
    }

    #[test]
    fn language_roundtrips_through_display() {
        for lang in Language::ALL {
            assert_eq!(lang.as_str().parse::<Language>().unwrap(), lang);
        }
    }
}
