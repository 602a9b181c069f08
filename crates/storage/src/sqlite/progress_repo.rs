use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::{LessonId, LessonProgress};

use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

use super::SqliteRepository;
use super::mapping::{map_lesson_id_row, map_progress_row};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(
        &self,
        lesson_id: &LessonId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT lesson_id, payload, updated_at
            FROM lesson_progress
            WHERE lesson_id = ?1
            ",
        )
        .bind(lesson_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let record = row.as_ref().map(map_progress_row).transpose()?;
        // A payload keyed under the wrong lesson is handed back as is; callers
        // reconcile it against the lesson they open.
        if let Some(record) = &record
            && record.lesson_id() != lesson_id
        {
            tracing::warn!(
                key = %lesson_id,
                stored = %record.lesson_id(),
                "progress row holds another lesson's payload"
            );
        }
        Ok(record)
    }

    async fn save_progress(
        &self,
        progress: &LessonProgress,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = ProgressRecord::encode(progress)?;
        sqlx::query(
            r"
            INSERT INTO lesson_progress (lesson_id, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(lesson_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(progress.lesson_id().as_str())
        .bind(payload)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        tracing::debug!(lesson = %progress.lesson_id(), "progress saved");
        Ok(())
    }

    async fn delete_progress(&self, lesson_id: &LessonId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM lesson_progress WHERE lesson_id = ?1")
            .bind(lesson_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_lessons(&self) -> Result<Vec<LessonId>, StorageError> {
        let rows = sqlx::query("SELECT lesson_id FROM lesson_progress ORDER BY lesson_id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_lesson_id_row).collect()
    }

    async fn reset_all(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM lesson_progress")
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        tracing::info!(removed = result.rows_affected(), "all lesson progress wiped");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use lesson_core::time::fixed_now;

    use super::*;

    #[tokio::test]
    async fn row_keyed_under_another_lesson_still_loads() {
        let repo = SqliteRepository::connect("sqlite:file:memdb_progress_mislabeled?mode=memory&cache=shared")
            .await
            .unwrap();
        repo.migrate().await.unwrap();

        let foreign = LessonProgress::new(LessonId::new("other-lesson"));
        sqlx::query("INSERT INTO lesson_progress (lesson_id, payload, updated_at) VALUES (?1, ?2, ?3)")
            .bind("target")
            .bind(ProgressRecord::encode(&foreign).unwrap())
            .bind(fixed_now())
            .execute(&repo.pool)
            .await
            .unwrap();

        let record = repo
            .load_progress(&LessonId::new("target"))
            .await
            .unwrap()
            .expect("row present");
        assert_eq!(record.lesson_id(), &LessonId::new("other-lesson"));
    }
}
