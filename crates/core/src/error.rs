use thiserror::Error;

use crate::model::{CourseError, LessonError};

/// Umbrella error for content validation in the core crate.
///
/// Evaluation and transitions never fail with this type; see
/// [`crate::TransitionRejected`] for refused mutations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Course(#[from] CourseError),
}
