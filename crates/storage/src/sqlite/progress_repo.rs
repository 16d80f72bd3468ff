use async_trait::async_trait;
use pathway_core::model::ProgressKey;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_snapshot(&self, key: &ProgressKey) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT payload
            FROM module_progress
            WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(key.user().as_str())
        .bind(key.course().as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.map(|row| row.try_get::<String, _>("payload").map_err(ser))
            .transpose()
    }

    async fn put_snapshot(&self, key: &ProgressKey, payload: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO module_progress (user_id, course_id, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, course_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key.user().as_str())
        .bind(key.course().as_str())
        .bind(payload)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn delete_snapshot(&self, key: &ProgressKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM module_progress WHERE user_id = ?1 AND course_id = ?2")
            .bind(key.user().as_str())
            .bind(key.course().as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        Ok(())
    }
}
