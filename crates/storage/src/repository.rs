use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::{LessonId, LessonProgress};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a lesson's progress: the value stored under its lesson id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub progress: LessonProgress,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn lesson_id(&self) -> &LessonId {
        self.progress.lesson_id()
    }

    /// Encode the progress as the JSON document stored in the key-value table.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn encode(progress: &LessonProgress) -> Result<String, StorageError> {
        serde_json::to_string(progress).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Decode a stored JSON document back into progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` on malformed documents.
    pub fn decode(raw: &str, updated_at: DateTime<Utc>) -> Result<Self, StorageError> {
        let progress = serde_json::from_str(raw)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Self {
            progress,
            updated_at,
        })
    }
}

/// Key-value persistence for lesson progress, keyed by lesson id.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the stored progress for a lesson, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn load_progress(
        &self,
        lesson_id: &LessonId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Insert or replace the progress stored under its lesson id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the progress cannot be stored.
    async fn save_progress(
        &self,
        progress: &LessonProgress,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Remove the progress stored for one lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing was stored for it.
    async fn delete_progress(&self, lesson_id: &LessonId) -> Result<(), StorageError>;

    /// Lesson ids that currently have stored progress, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failures.
    async fn list_lessons(&self) -> Result<Vec<LessonId>, StorageError>;

    /// Wipe progress for every lesson. Returns how many entries were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failures.
    async fn reset_all(&self) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<LessonId, (String, DateTime<Utc>)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(
        &self,
        lesson_id: &LessonId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(lesson_id)
            .map(|(raw, updated_at)| ProgressRecord::decode(raw, *updated_at))
            .transpose()
    }

    async fn save_progress(
        &self,
        progress: &LessonProgress,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let raw = ProgressRecord::encode(progress)?;
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(progress.lesson_id().clone(), (raw, updated_at));
        Ok(())
    }

    async fn delete_progress(&self, lesson_id: &LessonId) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .remove(lesson_id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn list_lessons(&self) -> Result<Vec<LessonId>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut ids: Vec<LessonId> = guard.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn reset_all(&self) -> Result<u64, StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let removed = u64::try_from(guard.len()).unwrap_or(u64::MAX);
        guard.clear();
        Ok(removed)
    }
}

/// Repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}
