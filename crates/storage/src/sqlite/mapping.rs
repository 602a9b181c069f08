use chrono::{DateTime, Utc};
use lesson_core::model::LessonId;
use sqlx::Row;

use crate::repository::{ProgressRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressRecord, StorageError> {
    let payload: String = row.try_get("payload").map_err(ser)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;
    ProgressRecord::decode(&payload, updated_at)
}

pub(crate) fn map_lesson_id_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<LessonId, StorageError> {
    let key: String = row.try_get("lesson_id").map_err(ser)?;
    key.parse().map_err(ser)
}
