#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod error;
pub mod progress;

pub use lesson_core::Clock;

pub use app_services::AppServices;
pub use catalog::{load_course, parse_course, parse_lesson};
pub use error::{AppServicesError, CatalogError, ProgressServiceError};
pub use progress::{LessonProgressService, Outcome, ProgressStore};
