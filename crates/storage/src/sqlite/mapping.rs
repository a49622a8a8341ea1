use annotate_core::model::{ExampleId, ProgressRecord, SessionScope, SubmissionId};
use sqlx::Row;
use std::collections::BTreeMap;

use crate::repository::{StorageError, SubmissionRecord};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn idx_i64(idx: usize) -> Result<i64, StorageError> {
    i64::try_from(idx).map_err(|_| StorageError::Serialization("example_idx overflow".into()))
}

/// Decodes a progress row's JSON payload, checking it still matches the
/// example id column it is keyed under.
pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(ExampleId, ProgressRecord), StorageError> {
    let example_id = ExampleId::new(row.try_get::<String, _>("example_id").map_err(ser)?);
    let payload: String = row.try_get("payload").map_err(ser)?;
    let record: ProgressRecord = serde_json::from_str(&payload).map_err(ser)?;

    if record.example_id() != &example_id {
        return Err(StorageError::Serialization(format!(
            "payload example id {} does not match row key {example_id}",
            record.example_id()
        )));
    }

    Ok((example_id, record))
}

pub(crate) fn map_submission_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SubmissionRecord, StorageError> {
    let id: SubmissionId = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let submitted_at = row.try_get("submitted_at").map_err(ser)?;
    let payload: String = row.try_get("payload").map_err(ser)?;
    let annotations: BTreeMap<ExampleId, ProgressRecord> =
        serde_json::from_str(&payload).map_err(ser)?;

    Ok(SubmissionRecord {
        id,
        submitted_at,
        annotations,
    })
}

/// Binds the three scope columns shared by every scoped query.
pub(crate) fn bind_scope<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    scope: &SessionScope,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(scope.annotator_id().as_str().to_owned())
        .bind(scope.task_type().as_str())
        .bind(scope.language().as_str())
}
