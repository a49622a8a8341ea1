use async_trait::async_trait;

use annotate_core::model::SessionScope;

use super::SqliteRepository;
use super::mapping::{bind_scope, idx_i64, map_submission_row, ser};
use crate::repository::{StorageError, SubmissionRecord, SubmissionRepository};

#[async_trait]
impl SubmissionRepository for SqliteRepository {
    async fn append_submission(
        &self,
        scope: &SessionScope,
        submission: &SubmissionRecord,
    ) -> Result<(), StorageError> {
        let payload = serde_json::to_string(&submission.annotations).map_err(ser)?;
        sqlx::query(
            r"
                INSERT INTO submissions (
                    id, annotator_id, task_type, language,
                    submitted_at, record_count, payload
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(submission.id.to_string())
        .bind(scope.annotator_id().as_str().to_owned())
        .bind(scope.task_type().as_str())
        .bind(scope.language().as_str())
        .bind(submission.submitted_at)
        .bind(idx_i64(submission.record_count())?)
        .bind(payload)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn list_submissions(
        &self,
        scope: &SessionScope,
    ) -> Result<Vec<SubmissionRecord>, StorageError> {
        let query = sqlx::query(
            r"
                SELECT id, submitted_at, payload
                FROM submissions
                WHERE annotator_id = ?1 AND task_type = ?2 AND language = ?3
                ORDER BY submitted_at DESC, id DESC
            ",
        );
        let rows = bind_scope(query, scope)
            .fetch_all(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_submission_row(&row)?);
        }
        Ok(out)
    }
}
