//! Deep-link parsing for annotation sessions.
//!
//! Session identity travels in URL query parameters (`annotator_id`,
//! `language`, `example_idx`); the task type is part of the path, e.g.
//! `app://annotate/judgment/...?annotator_id=a1&language=English`.

use thiserror::Error;
use url::Url;

use crate::model::{ScopeError, SessionScope, TaskType};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionParamsError {
    #[error("invalid session url: {0}")]
    Url(#[from] url::ParseError),

    #[error("missing required parameter: {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Scope(#[from] ScopeError),
}

/// Everything needed to resume an annotation session from a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub scope: SessionScope,
    pub example_idx: usize,
}

impl SessionParams {
    /// Parses session parameters out of a deep link.
    ///
    /// A malformed or absent `example_idx` falls back to 0; a missing
    /// annotator id or language is an error, since the caller cannot guess a
    /// storage scope.
    ///
    /// # Errors
    ///
    /// Returns `SessionParamsError` for unparseable URLs, a path without a
    /// task segment, or missing/invalid identity parameters.
    pub fn from_url(raw: &str) -> Result<Self, SessionParamsError> {
        let url = Url::parse(raw)?;
        let task_type =
            task_type_from_path(&url).ok_or(SessionParamsError::Missing("task type"))?;

        let mut annotator_id = None;
        let mut language = None;
        let mut example_idx = 0;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "annotator_id" => annotator_id = Some(value.into_owned()),
                "language" => language = Some(value.into_owned()),
                "example_idx" => example_idx = value.parse().unwrap_or(0),
                _ => {}
            }
        }

        let annotator_id =
            annotator_id.ok_or(SessionParamsError::Missing("annotator_id"))?;
        let language = language.ok_or(SessionParamsError::Missing("language"))?;
        let scope =
            SessionScope::parse(&annotator_id, task_type.as_str(), &language)?;

        Ok(Self { scope, example_idx })
    }
}

fn task_type_from_path(url: &Url) -> Option<TaskType> {
    url.path_segments()?
        .find_map(|segment| segment.parse::<TaskType>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Language, TaskType};

    #[test]
    fn parses_full_session_link() {
        let params = SessionParams::from_url(
            "app://annotate/judgment?annotator_id=a1&language=English&example_idx=3",
        )
        .unwrap();

        assert_eq!(params.scope.annotator_id().as_str(), "a1");
        assert_eq!(params.scope.task_type(), TaskType::Judgment);
        assert_eq!(params.scope.language(), Language::English);
        assert_eq!(params.example_idx, 3);
    }

    #[test]
    fn malformed_example_idx_falls_back_to_zero() {
        let params = SessionParams::from_url(
            "app://annotate/writing?annotator_id=a1&language=Thai&example_idx=soon",
        )
        .unwrap();
        assert_eq!(params.example_idx, 0);
    }

    #[test]
    fn missing_annotator_is_fatal() {
        let err =
            SessionParams::from_url("app://annotate/judgment?language=English").unwrap_err();
        assert_eq!(err, SessionParamsError::Missing("annotator_id"));
    }

    #[test]
    fn missing_language_is_fatal() {
        let err =
            SessionParams::from_url("app://annotate/judgment?annotator_id=a1").unwrap_err();
        assert_eq!(err, SessionParamsError::Missing("language"));
    }

    #[test]
    fn path_without_task_segment_is_rejected() {
        let err = SessionParams::from_url(
            "app://annotate/review?annotator_id=a1&language=English",
        )
        .unwrap_err();
        assert_eq!(err, SessionParamsError::Missing("task type"));
    }
}
