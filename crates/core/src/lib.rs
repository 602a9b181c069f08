//! Progressive lesson engine: data model, unlock evaluation, progress
//! aggregation and the transition rules that mutate learner progress.
//!
//! Everything in this crate is synchronous, in-memory and free of I/O.

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod error;
pub mod model;
pub mod time;
pub mod transition;
pub mod unlock;

pub use aggregate::{ProgressSummary, lesson_progress_percent, summarize};
pub use error::Error;
pub use time::Clock;
pub use transition::{
    Navigated, TransitionRejected, mark_completed, navigate, reconcile, record_attempt,
};
pub use unlock::{is_index_unlocked, is_section_unlocked, unlock_states};
