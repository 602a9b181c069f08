//! Unlock evaluation: which sections of a lesson a learner may open.
//!
//! A section is reachable when it is the first one, or when the section right
//! before it is either practice-only or completed. Every check fails closed:
//! out-of-range indices, a section that does not sit at the given index, and
//! progress recorded for a different lesson all read as locked.

use crate::model::{Lesson, LessonProgress, Section};

/// Whether `section`, found at `index` in `lesson`, is currently unlocked.
#[must_use]
pub fn is_section_unlocked(
    section: &Section,
    index: usize,
    progress: &LessonProgress,
    lesson: &Lesson,
) -> bool {
    match lesson.section(index) {
        Some(at_index) if at_index.id == section.id => is_index_unlocked(index, progress, lesson),
        _ => false,
    }
}

/// Whether the section at `index` is currently unlocked.
#[must_use]
pub fn is_index_unlocked(index: usize, progress: &LessonProgress, lesson: &Lesson) -> bool {
    if index >= lesson.len() {
        return false;
    }
    if index == 0 {
        return true;
    }
    if !progress.belongs_to(lesson) {
        return false;
    }

    let Some(previous) = lesson.section(index - 1) else {
        return false;
    };
    !previous.required_for_progress || progress.status_of(&previous.id).is_completed()
}

/// Unlock state for every section, in lesson order.
#[must_use]
pub fn unlock_states(progress: &LessonProgress, lesson: &Lesson) -> Vec<bool> {
    (0..lesson.len())
        .map(|index| is_index_unlocked(index, progress, lesson))
        .collect()
}

/// Closest unlocked index at or before `index`, for repairing a stale cursor.
///
/// Returns 0 for an empty lesson.
#[must_use]
pub fn nearest_unlocked_at_or_before(
    index: usize,
    progress: &LessonProgress,
    lesson: &Lesson,
) -> usize {
    let start = index.min(lesson.len().saturating_sub(1));
    (0..=start)
        .rev()
        .find(|&candidate| is_index_unlocked(candidate, progress, lesson))
        .unwrap_or(0)
}
