//! Content supply: the static course catalog, authored as JSON.

use std::path::Path;

use lesson_core::model::{Course, CourseDraft, Lesson, LessonDraft};

use crate::error::CatalogError;

/// Parse and validate a course from its JSON source.
///
/// # Errors
///
/// Returns `CatalogError::Parse` for malformed JSON and
/// `CatalogError::Invalid` when authoring invariants are broken.
pub fn parse_course(raw: &str) -> Result<Course, CatalogError> {
    let draft: CourseDraft = serde_json::from_str(raw)?;
    let course = draft.validate().map_err(lesson_core::Error::from)?;
    tracing::debug!(
        modules = course.modules().len(),
        lessons = course.lessons().count(),
        "course catalog loaded"
    );
    Ok(course)
}

/// Parse and validate a single stand-alone lesson.
///
/// # Errors
///
/// Returns `CatalogError::Parse` for malformed JSON and
/// `CatalogError::Invalid` when the lesson breaks authoring invariants.
pub fn parse_lesson(raw: &str) -> Result<Lesson, CatalogError> {
    let draft: LessonDraft = serde_json::from_str(raw)?;
    draft
        .validate()
        .map_err(|err| CatalogError::Invalid(err.into()))
}

/// Read a course catalog from disk.
///
/// # Errors
///
/// Returns `CatalogError::Io` if the file cannot be read, plus any
/// error from [`parse_course`].
pub fn load_course(path: &Path) -> Result<Course, CatalogError> {
    let raw = std::fs::read_to_string(path)?;
    parse_course(&raw)
}
