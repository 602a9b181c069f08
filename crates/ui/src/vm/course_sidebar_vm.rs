use lesson_core::model::{Course, LessonId, ModuleId};
use services::ProgressStore;

use crate::context::SidebarUiState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LessonEntryVm {
    pub id: LessonId,
    pub title: String,
    pub open: bool,
    /// Rounded completion, known only for the lesson that is open.
    pub percent: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleRowVm {
    pub index: usize,
    pub id: ModuleId,
    pub title: String,
    pub lesson_count: usize,
    pub active: bool,
    pub expanded: bool,
    /// Lessons listed under the module; empty while it is collapsed.
    pub lessons: Vec<LessonEntryVm>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CourseSidebarVm {
    pub modules: Vec<ModuleRowVm>,
}

/// Build the course-wide sidebar.
///
/// Which modules are expanded comes from `ui`; the open lesson's completion is
/// read from `store`, the same state every other surface reads.
#[must_use]
pub fn map_course_sidebar(
    course: &Course,
    active_module: usize,
    ui: &SidebarUiState,
    store: &ProgressStore,
) -> CourseSidebarVm {
    let open_lesson = store.lesson().id();
    let open_percent = store.summary().rounded_percent();

    let modules = course
        .modules()
        .iter()
        .enumerate()
        .map(|(index, module)| {
            let expanded = ui.is_expanded(index);
            let lessons = if expanded {
                module
                    .lessons()
                    .iter()
                    .map(|lesson| {
                        let open = lesson.id() == open_lesson;
                        LessonEntryVm {
                            id: lesson.id().clone(),
                            title: lesson.title().to_owned(),
                            open,
                            percent: open.then_some(open_percent),
                        }
                    })
                    .collect()
            } else {
                Vec::new()
            };
            ModuleRowVm {
                index,
                id: module.id().clone(),
                title: module.title().to_owned(),
                lesson_count: module.lessons().len(),
                active: index == active_module,
                expanded,
                lessons,
            }
        })
        .collect();

    CourseSidebarVm { modules }
}
