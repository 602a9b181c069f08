use lesson_core::model::{QuizPlacement, SectionId, SectionStatus};
use services::ProgressStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolutionVm {
    pub code: String,
    pub explanation: Option<String>,
}

/// Exercise panel state. Hints and the solution appear once the attempt count
/// reaches their thresholds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseVm {
    pub section_id: SectionId,
    pub title: String,
    pub instructions: String,
    pub starter_code: String,
    pub status: SectionStatus,
    pub attempts: u32,
    pub visible_hints: Vec<String>,
    pub hidden_hints: usize,
    pub solution: Option<SolutionVm>,
    /// Attempts still needed before the solution shows; `None` when there is
    /// no solution or it is already visible.
    pub attempts_until_solution: Option<u32>,
    pub test_case_count: usize,
    pub quiz_placement: Option<QuizPlacement>,
}

/// Build the exercise panel for the section at `index`.
///
/// Returns `None` when the index is out of range or the section is not an exercise.
#[must_use]
pub fn map_exercise(store: &ProgressStore, index: usize) -> Option<ExerciseVm> {
    store.read(|lesson, progress| {
        let section = lesson.section(index)?;
        let payload = section.exercise()?;
        let entry = progress.section_progress(&section.id);
        let attempts = entry.attempt_count;

        let visible_hints: Vec<String> = payload
            .revealed_hints(attempts)
            .map(|hint| hint.text.clone())
            .collect();
        let hidden_hints = payload.hints.len() - visible_hints.len();

        let solution = payload
            .solution
            .as_ref()
            .filter(|solution| solution.is_revealed(attempts))
            .map(|solution| SolutionVm {
                code: solution.code.clone(),
                explanation: solution.explanation.clone(),
            });
        let attempts_until_solution = payload
            .solution
            .as_ref()
            .filter(|solution| !solution.is_revealed(attempts))
            .map(|solution| solution.after_attempt - attempts);

        Some(ExerciseVm {
            section_id: section.id.clone(),
            title: section.title.clone(),
            instructions: payload.instructions.clone(),
            starter_code: payload.starter_code.clone(),
            status: entry.status,
            attempts,
            visible_hints,
            hidden_hints,
            solution,
            attempts_until_solution,
            test_case_count: payload.test_cases.len(),
            quiz_placement: payload.quiz_placement,
        })
    })
}
