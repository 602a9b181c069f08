mod course_sidebar_vm;
mod exercise_vm;
mod lesson_sidebar_vm;

pub use course_sidebar_vm::{CourseSidebarVm, LessonEntryVm, ModuleRowVm, map_course_sidebar};
pub use exercise_vm::{ExerciseVm, SolutionVm, map_exercise};
pub use lesson_sidebar_vm::{LessonSidebarVm, SectionRowVm, build_lesson_sidebar, map_lesson_sidebar};
