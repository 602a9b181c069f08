//! The only legal mutations of a `LessonProgress`.
//!
//! Each transition checks its target against the lesson and the unlock rules
//! first. A refused transition leaves progress untouched and reports why via
//! [`TransitionRejected`]; callers are expected to treat that as a no-op.

use thiserror::Error;

use crate::model::{
    Lesson, LessonId, LessonProgress, SectionId, SectionProgress, SectionStatus,
};
use crate::unlock::is_index_unlocked;

/// Why a transition was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionRejected {
    #[error("progress belongs to lesson {progress}, not {lesson}")]
    StaleProgress { progress: LessonId, lesson: LessonId },

    #[error("section {0} is not part of this lesson")]
    UnknownSection(SectionId),

    #[error("section index {index} is out of range for {len} sections")]
    OutOfRange { index: usize, len: usize },

    #[error("section at index {0} is locked")]
    Locked(usize),

    #[error("section {0} does not take attempts")]
    NoAttempts(SectionId),
}

/// Result of a successful navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigated {
    pub from: usize,
    pub to: usize,
}

impl Navigated {
    #[must_use]
    pub fn moved(&self) -> bool {
        self.from != self.to
    }
}

fn ensure_current(lesson: &Lesson, progress: &LessonProgress) -> Result<(), TransitionRejected> {
    if progress.belongs_to(lesson) {
        Ok(())
    } else {
        Err(TransitionRejected::StaleProgress {
            progress: progress.lesson_id().clone(),
            lesson: lesson.id().clone(),
        })
    }
}

fn unlocked_position(
    lesson: &Lesson,
    progress: &LessonProgress,
    section_id: &SectionId,
) -> Result<usize, TransitionRejected> {
    ensure_current(lesson, progress)?;
    let index = lesson
        .position_of(section_id)
        .ok_or_else(|| TransitionRejected::UnknownSection(section_id.clone()))?;
    if !is_index_unlocked(index, progress, lesson) {
        return Err(TransitionRejected::Locked(index));
    }
    Ok(index)
}

/// Count one more attempt on an exercise or quiz and return its updated record.
///
/// An untouched section moves to `in_progress`; a completed one stays completed.
///
/// # Errors
///
/// Rejected when progress is stale, the section is unknown or locked, or its
/// kind has no attempts (readings and checkpoints).
pub fn record_attempt(
    lesson: &Lesson,
    progress: &mut LessonProgress,
    section_id: &SectionId,
) -> Result<SectionProgress, TransitionRejected> {
    let index = unlocked_position(lesson, progress, section_id)?;
    if !lesson
        .section(index)
        .is_some_and(|section| section.kind().has_attempts())
    {
        return Err(TransitionRejected::NoAttempts(section_id.clone()));
    }
    let entry = progress.entry_mut(section_id);
    entry.attempt_count = entry.attempt_count.saturating_add(1);
    entry.advance_to(SectionStatus::InProgress);
    Ok(*entry)
}

/// Mark a section completed. Idempotent, and leaves `attempt_count` alone.
///
/// Returns the updated record and whether the status actually changed.
///
/// # Errors
///
/// Rejected when progress is stale, the section is unknown, or it is locked.
pub fn mark_completed(
    lesson: &Lesson,
    progress: &mut LessonProgress,
    section_id: &SectionId,
) -> Result<(SectionProgress, bool), TransitionRejected> {
    unlocked_position(lesson, progress, section_id)?;
    let entry = progress.entry_mut(section_id);
    let changed = entry.advance_to(SectionStatus::Completed);
    Ok((*entry, changed))
}

/// Point the learner at `index`, if that section is unlocked.
///
/// # Errors
///
/// Rejected when progress is stale, `index` is out of range, or the target is locked.
pub fn navigate(
    lesson: &Lesson,
    progress: &mut LessonProgress,
    index: usize,
) -> Result<Navigated, TransitionRejected> {
    ensure_current(lesson, progress)?;
    if index >= lesson.len() {
        return Err(TransitionRejected::OutOfRange {
            index,
            len: lesson.len(),
        });
    }
    if !is_index_unlocked(index, progress, lesson) {
        return Err(TransitionRejected::Locked(index));
    }

    let from = progress.current_section_index();
    progress.set_current_section_index(index);
    Ok(Navigated { from, to: index })
}

/// Bring persisted progress in line with the lesson being opened.
///
/// Progress for a different lesson is replaced by a fresh start. A cursor that
/// no longer points at an unlocked section is pulled back to the closest
/// unlocked section before it. Orphaned entries are kept as-is.
#[must_use]
pub fn reconcile(lesson: &Lesson, progress: LessonProgress) -> LessonProgress {
    let mut progress = if progress.belongs_to(lesson) {
        progress
    } else {
        LessonProgress::for_lesson(lesson)
    };

    let current = progress.current_section_index();
    if !is_index_unlocked(current, &progress, lesson) {
        let repaired = crate::unlock::nearest_unlocked_at_or_before(current, &progress, lesson);
        progress.set_current_section_index(repaired);
    }
    progress
}
