use crate::model::{Lesson, LessonProgress};

/// Completed-vs-total counts for a lesson, recomputed from progress on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
}

impl ProgressSummary {
    /// Completion in `[0.0, 100.0]`. A lesson without sections reports 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.completed as f64 / self.total as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Percent rounded to the nearest whole number, for progress bars.
    ///
    /// Only a complete lesson shows 100; anything short of that caps at 99.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rounded_percent(&self) -> u8 {
        if self.is_complete() {
            return 100;
        }
        (self.percent().round() as u8).min(99)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Count completed sections of `lesson`.
///
/// Only sections that belong to the lesson count; orphaned entries and
/// progress recorded for another lesson contribute nothing.
#[must_use]
pub fn summarize(lesson: &Lesson, progress: &LessonProgress) -> ProgressSummary {
    let completed = if progress.belongs_to(lesson) {
        lesson
            .sections()
            .iter()
            .filter(|section| progress.status_of(&section.id).is_completed())
            .count()
    } else {
        0
    };

    ProgressSummary {
        completed,
        total: lesson.len(),
    }
}

/// Lesson completion percentage in `[0.0, 100.0]`.
#[must_use]
pub fn lesson_progress_percent(lesson: &Lesson, progress: &LessonProgress) -> f64 {
    summarize(lesson, progress).percent()
}
