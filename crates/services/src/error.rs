//! Shared error types for the services crate.

use thiserror::Error;

use lesson_core::model::LessonId;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while loading the course catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] lesson_core::Error),
}

/// Errors emitted by `LessonProgressService`.
///
/// Refused transitions are not errors; they come back as `Outcome::Rejected`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
    #[error("lesson {0} is not in the catalog")]
    UnknownLesson(LessonId),
    #[error("the catalog has no lessons")]
    EmptyCatalog,
}
