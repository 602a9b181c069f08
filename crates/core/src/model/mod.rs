mod course;
mod ids;
mod lesson;
mod progress;
mod section;

pub use ids::{LessonId, ModuleId, ParseIdError, SectionId};

pub use course::{Course, CourseDraft, CourseError, CourseModule, CourseModuleDraft};
pub use lesson::{Lesson, LessonDraft, LessonError};
pub use progress::{LessonProgress, SectionProgress, SectionStatus};
pub use section::{
    ExercisePayload, Hint, QuizPlacement, QuizQuestion, Section, SectionContent, SectionKind,
    Solution, TestCase,
};
