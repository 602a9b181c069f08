mod service;
mod store;

// Public API of the progress subsystem.
pub use crate::error::ProgressServiceError;
pub use service::{LessonProgressService, Outcome};
pub use store::ProgressStore;
