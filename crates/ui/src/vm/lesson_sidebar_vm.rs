use lesson_core::model::{Lesson, LessonId, LessonProgress, SectionId, SectionKind, SectionStatus};
use services::ProgressStore;

/// One row of the lesson-local sidebar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionRowVm {
    pub index: usize,
    pub id: SectionId,
    pub title: String,
    pub kind: SectionKind,
    pub status: SectionStatus,
    pub attempts: u32,
    pub required: bool,
    pub unlocked: bool,
    pub current: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonSidebarVm {
    pub lesson_id: LessonId,
    pub title: String,
    pub rows: Vec<SectionRowVm>,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

impl LessonSidebarVm {
    #[must_use]
    pub fn current_row(&self) -> Option<&SectionRowVm> {
        self.rows.iter().find(|row| row.current)
    }
}

/// Build the sidebar from the live progress of an open lesson.
#[must_use]
pub fn map_lesson_sidebar(store: &ProgressStore) -> LessonSidebarVm {
    store.read(build_lesson_sidebar)
}

/// Build the sidebar for `lesson` as seen through `progress`.
#[must_use]
pub fn build_lesson_sidebar(lesson: &Lesson, progress: &LessonProgress) -> LessonSidebarVm {
    let unlocked = lesson_core::unlock_states(progress, lesson);
    let rows = lesson
        .sections()
        .iter()
        .zip(unlocked)
        .enumerate()
        .map(|(index, (section, unlocked))| {
            let entry = progress.section_progress(&section.id);
            SectionRowVm {
                index,
                id: section.id.clone(),
                title: section.title.clone(),
                kind: section.kind(),
                status: entry.status,
                attempts: entry.attempt_count,
                required: section.required_for_progress,
                unlocked,
                current: index == progress.current_section_index(),
            }
        })
        .collect();

    let summary = lesson_core::summarize(lesson, progress);
    LessonSidebarVm {
        lesson_id: lesson.id().clone(),
        title: lesson.title().to_owned(),
        rows,
        completed: summary.completed,
        total: summary.total,
        percent: summary.rounded_percent(),
    }
}
