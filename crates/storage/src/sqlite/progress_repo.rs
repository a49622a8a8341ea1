use async_trait::async_trait;
use std::collections::BTreeMap;

use annotate_core::model::{ExampleId, ProgressRecord, SessionScope};

use super::SqliteRepository;
use super::mapping::{bind_scope, idx_i64, map_progress_row, ser};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load(
        &self,
        scope: &SessionScope,
        example_id: &ExampleId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let query = sqlx::query(
            r"
                SELECT example_id, payload
                FROM progress_records
                WHERE annotator_id = ?1 AND task_type = ?2 AND language = ?3
                  AND example_id = ?4
            ",
        );
        let row = bind_scope(query, scope)
            .bind(example_id.as_str().to_owned())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.map(|row| map_progress_row(&row).map(|(_, record)| record))
            .transpose()
    }

    async fn save(
        &self,
        scope: &SessionScope,
        record: &ProgressRecord,
    ) -> Result<(), StorageError> {
        let payload = serde_json::to_string(record).map_err(ser)?;
        let query = sqlx::query(
            r"
                INSERT INTO progress_records (
                    annotator_id, task_type, language, example_id,
                    example_idx, payload, last_modified
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(annotator_id, task_type, language, example_id)
                DO UPDATE SET
                    example_idx = excluded.example_idx,
                    payload = excluded.payload,
                    last_modified = excluded.last_modified
            ",
        );
        bind_scope(query, scope)
            .bind(record.example_id().as_str().to_owned())
            .bind(idx_i64(record.example_idx())?)
            .bind(payload)
            .bind(record.last_modified())
            .execute(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn load_all(
        &self,
        scope: &SessionScope,
    ) -> Result<BTreeMap<ExampleId, ProgressRecord>, StorageError> {
        let query = sqlx::query(
            r"
                SELECT example_id, payload
                FROM progress_records
                WHERE annotator_id = ?1 AND task_type = ?2 AND language = ?3
            ",
        );
        let rows = bind_scope(query, scope)
            .fetch_all(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = BTreeMap::new();
        for row in rows {
            let (example_id, record) = map_progress_row(&row)?;
            out.insert(example_id, record);
        }
        Ok(out)
    }

    async fn clear(&self, scope: &SessionScope) -> Result<bool, StorageError> {
        let query = sqlx::query(
            r"
                DELETE FROM progress_records
                WHERE annotator_id = ?1 AND task_type = ?2 AND language = ?3
            ",
        );
        let result = bind_scope(query, scope)
            .execute(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, scope: &SessionScope) -> Result<usize, StorageError> {
        let query = sqlx::query(
            r"
                SELECT COUNT(*) AS n
                FROM progress_records
                WHERE annotator_id = ?1 AND task_type = ?2 AND language = ?3
            ",
        );
        let row = bind_scope(query, scope)
            .fetch_one(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let n: i64 = sqlx::Row::try_get(&row, "n").map_err(ser)?;
        usize::try_from(n).map_err(|_| StorageError::Serialization(format!("invalid count: {n}")))
    }
}
