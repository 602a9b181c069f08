//! Plain-text rendering of the navigation surfaces, for terminals and logs.

use std::fmt::Write;

use lesson_core::model::{QuizPlacement, Section, SectionContent, SectionStatus};

use crate::vm::{CourseSidebarVm, ExerciseVm, LessonSidebarVm};

const BAR_WIDTH: usize = 20;

fn status_marker(status: SectionStatus, unlocked: bool) -> &'static str {
    match (status, unlocked) {
        (SectionStatus::Completed, _) => "[x]",
        (_, false) => "[#]",
        (SectionStatus::InProgress, true) => "[~]",
        (SectionStatus::NotStarted, true) => "[ ]",
    }
}

/// `[#####---------------]  25%`
#[must_use]
pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

#[must_use]
pub fn render_lesson_sidebar(vm: &LessonSidebarVm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", vm.title, vm.lesson_id);
    let _ = writeln!(
        out,
        "{} {}/{} sections",
        progress_bar(vm.percent),
        vm.completed,
        vm.total
    );
    for row in &vm.rows {
        let cursor = if row.current { '>' } else { ' ' };
        let _ = write!(
            out,
            "{cursor} {} {:>2}. {} <{}> [{}]",
            status_marker(row.status, row.unlocked),
            row.index,
            row.title,
            row.id,
            row.kind.as_str()
        );
        if row.attempts > 0 {
            let _ = write!(out, " attempts={}", row.attempts);
        }
        if !row.required {
            out.push_str(" (practice)");
        }
        if !row.unlocked {
            out.push_str(" (locked)");
        }
        out.push('\n');
    }
    out
}

#[must_use]
pub fn render_course_sidebar(vm: &CourseSidebarVm) -> String {
    let mut out = String::new();
    for module in &vm.modules {
        let fold = if module.expanded { 'v' } else { '>' };
        let active = if module.active { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{active}{fold} {:>2}. {} ({} lessons)",
            module.index, module.title, module.lesson_count
        );
        for lesson in &module.lessons {
            let marker = if lesson.open { "->" } else { "  " };
            let _ = write!(out, "     {marker} {} <{}>", lesson.title, lesson.id);
            if let Some(percent) = lesson.percent {
                let _ = write!(out, " {percent}%");
            }
            out.push('\n');
        }
    }
    out
}

#[must_use]
pub fn render_exercise(vm: &ExerciseVm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Exercise: {} <{}>", vm.title, vm.section_id);
    let _ = writeln!(
        out,
        "status={} attempts={} test_cases={}",
        vm.status.as_str(),
        vm.attempts,
        vm.test_case_count
    );
    if vm.quiz_placement == Some(QuizPlacement::Before) {
        out.push_str("(quiz comes first)\n");
    }
    let _ = writeln!(out, "\n{}", vm.instructions);
    if !vm.starter_code.is_empty() {
        let _ = writeln!(out, "\n{}", vm.starter_code);
    }
    for (number, hint) in vm.visible_hints.iter().enumerate() {
        let _ = writeln!(out, "Hint {}: {hint}", number + 1);
    }
    if vm.hidden_hints > 0 {
        let _ = writeln!(out, "{} more hint(s) after further attempts", vm.hidden_hints);
    }
    match (&vm.solution, vm.attempts_until_solution) {
        (Some(solution), _) => {
            let _ = writeln!(out, "Solution:\n{}", solution.code);
            if let Some(explanation) = &solution.explanation {
                let _ = writeln!(out, "{explanation}");
            }
        }
        (None, Some(remaining)) => {
            let _ = writeln!(out, "Solution unlocks in {remaining} attempt(s)");
        }
        (None, None) => {}
    }
    if vm.quiz_placement == Some(QuizPlacement::After) {
        out.push_str("(quiz follows)\n");
    }
    out
}

/// Body of a non-exercise section.
#[must_use]
pub fn render_section_body(section: &Section) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", section.title, section.kind().as_str());
    match &section.content {
        SectionContent::Reading { body } => {
            let _ = writeln!(out, "\n{body}");
        }
        SectionContent::Quiz { questions } => {
            for (number, question) in questions.iter().enumerate() {
                let _ = writeln!(out, "\nQ{}. {}", number + 1, question.prompt);
                for (option, text) in question.options.iter().enumerate() {
                    let _ = writeln!(out, "   {}) {text}", option + 1);
                }
            }
        }
        SectionContent::Checkpoint {
            summary,
            objectives,
        } => {
            let _ = writeln!(out, "\n{summary}");
            for objective in objectives {
                let _ = writeln!(out, " - {objective}");
            }
        }
        SectionContent::Exercise(payload) => {
            let _ = writeln!(out, "\n{}", payload.instructions);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::{Lesson, LessonId, LessonProgress, SectionId};

    use crate::vm::build_lesson_sidebar;

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(progress_bar(0), format!("[{}]   0%", "-".repeat(20)));
        assert_eq!(progress_bar(100), format!("[{}] 100%", "#".repeat(20)));
        assert!(progress_bar(50).starts_with("[##########-"));
    }

    #[test]
    fn sidebar_marks_cursor_and_locks() {
        let lesson = Lesson::new(
            LessonId::new("tries"),
            "Tries",
            vec![
                Section::new(
                    SectionId::new("insert"),
                    "Insert",
                    SectionContent::Reading { body: String::new() },
                ),
                Section::new(
                    SectionId::new("search"),
                    "Search",
                    SectionContent::Reading { body: String::new() },
                ),
            ],
        )
        .unwrap();
        let progress = LessonProgress::for_lesson(&lesson);
        let text = render_lesson_sidebar(&build_lesson_sidebar(&lesson, &progress));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Tries (tries)");
        assert!(lines[2].starts_with("> [ ]  0. Insert"));
        assert!(lines[3].starts_with("  [#]  1. Search"));
        assert!(lines[3].ends_with("(locked)"));
    }
}
