//! Navigation surfaces over the lesson engine: view models, the shared
//! application state and a plain-text renderer.

#![forbid(unsafe_code)]

pub mod context;
pub mod render;
pub mod vm;

pub use context::{AppState, IntentOutcome, NavigationIntent, SidebarUiState, ViewError};
