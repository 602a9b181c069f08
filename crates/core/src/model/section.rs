use serde::{Deserialize, Serialize};

use crate::model::ids::SectionId;

//
// ─── SECTION KIND ──────────────────────────────────────────────────────────────
//

/// The four kinds of step a lesson is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Reading,
    Exercise,
    Quiz,
    Checkpoint,
}

impl SectionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Reading => "reading",
            SectionKind::Exercise => "exercise",
            SectionKind::Quiz => "quiz",
            SectionKind::Checkpoint => "checkpoint",
        }
    }

    /// Whether learners submit attempts against this kind of section.
    #[must_use]
    pub fn has_attempts(self) -> bool {
        matches!(self, SectionKind::Exercise | SectionKind::Quiz)
    }
}

//
// ─── EXERCISE PAYLOAD ──────────────────────────────────────────────────────────
//

/// A hint that becomes visible once the learner has made `after_attempt` attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub text: String,
    pub after_attempt: u32,
}

impl Hint {
    #[must_use]
    pub fn is_revealed(&self, attempts: u32) -> bool {
        attempts >= self.after_attempt
    }
}

/// Reference solution, gated behind a higher attempt threshold than the hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub code: String,
    #[serde(default)]
    pub explanation: Option<String>,
    pub after_attempt: u32,
}

impl Solution {
    #[must_use]
    pub fn is_revealed(&self, attempts: u32) -> bool {
        attempts >= self.after_attempt
    }
}

/// Input/expected-output pair handed to the external grader. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Where an exercise's companion quiz is shown relative to the exercise body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPlacement {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExercisePayload {
    pub instructions: String,
    #[serde(default)]
    pub starter_code: String,
    #[serde(default)]
    pub hints: Vec<Hint>,
    #[serde(default)]
    pub solution: Option<Solution>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub quiz_placement: Option<QuizPlacement>,
}

impl ExercisePayload {
    /// Hints visible after `attempts` attempts, in authored order.
    pub fn revealed_hints(&self, attempts: u32) -> impl Iterator<Item = &Hint> {
        self.hints.iter().filter(move |hint| hint.is_revealed(attempts))
    }

    #[must_use]
    pub fn solution_revealed(&self, attempts: u32) -> bool {
        self.solution
            .as_ref()
            .is_some_and(|solution| solution.is_revealed(attempts))
    }
}

//
// ─── QUIZ / READING / CHECKPOINT PAYLOADS ──────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize,
}

impl QuizQuestion {
    #[must_use]
    pub fn is_correct(&self, chosen: usize) -> bool {
        chosen == self.correct_option
    }
}

/// Type-specific body of a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionContent {
    Reading {
        body: String,
    },
    Exercise(ExercisePayload),
    Quiz {
        questions: Vec<QuizQuestion>,
    },
    Checkpoint {
        summary: String,
        #[serde(default)]
        objectives: Vec<String>,
    },
}

impl SectionContent {
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionContent::Reading { .. } => SectionKind::Reading,
            SectionContent::Exercise(_) => SectionKind::Exercise,
            SectionContent::Quiz { .. } => SectionKind::Quiz,
            SectionContent::Checkpoint { .. } => SectionKind::Checkpoint,
        }
    }
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// One step of a lesson. Its position is its index in the owning lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    /// Practice-only sections set this to false and never block the next section.
    #[serde(default = "required_by_default")]
    pub required_for_progress: bool,
    #[serde(flatten)]
    pub content: SectionContent,
}

fn required_by_default() -> bool {
    true
}

impl Section {
    #[must_use]
    pub fn new(id: SectionId, title: impl Into<String>, content: SectionContent) -> Self {
        Self {
            id,
            title: title.into(),
            required_for_progress: true,
            content,
        }
    }

    #[must_use]
    pub fn practice_only(mut self) -> Self {
        self.required_for_progress = false;
        self
    }

    #[must_use]
    pub fn kind(&self) -> SectionKind {
        self.content.kind()
    }

    #[must_use]
    pub fn exercise(&self) -> Option<&ExercisePayload> {
        match &self.content {
            SectionContent::Exercise(payload) => Some(payload),
            _ => None,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise() -> ExercisePayload {
        ExercisePayload {
            instructions: "Return the indices of two numbers adding up to target.".into(),
            starter_code: "fn two_sum(nums: &[i32], target: i32) -> (usize, usize) {}".into(),
            hints: vec![
                Hint {
                    text: "Think about complements.".into(),
                    after_attempt: 1,
                },
                Hint {
                    text: "A hash map gives O(1) lookups.".into(),
                    after_attempt: 2,
                },
            ],
            solution: Some(Solution {
                code: "/* ... */".into(),
                explanation: None,
                after_attempt: 3,
            }),
            test_cases: Vec::new(),
            quiz_placement: None,
        }
    }

    #[test]
    fn hints_unlock_by_attempt_threshold() {
        let payload = exercise();
        assert_eq!(payload.revealed_hints(0).count(), 0);
        assert_eq!(payload.revealed_hints(1).count(), 1);
        assert_eq!(payload.revealed_hints(5).count(), 2);
    }

    #[test]
    fn solution_waits_for_its_own_threshold() {
        let payload = exercise();
        assert!(!payload.solution_revealed(2));
        assert!(payload.solution_revealed(3));
    }

    #[test]
    fn section_json_defaults_to_required() {
        let raw = r#"{"id":"intro","title":"Intro","kind":"reading","body":"Hello"}"#;
        let section: Section = serde_json::from_str(raw).unwrap();
        assert!(section.required_for_progress);
        assert_eq!(section.kind(), SectionKind::Reading);
    }

    #[test]
    fn exercise_section_parses_flattened_payload() {
        let raw = r#"{
            "id": "two-sum",
            "title": "Two Sum",
            "required_for_progress": false,
            "kind": "exercise",
            "instructions": "Solve it",
            "hints": [{"text": "hash map", "after_attempt": 2}],
            "solution": {"code": "fn x() {}", "after_attempt": 3},
            "quiz_placement": "after"
        }"#;
        let section: Section = serde_json::from_str(raw).unwrap();
        assert!(!section.required_for_progress);
        let payload = section.exercise().unwrap();
        assert_eq!(payload.hints.len(), 1);
        assert_eq!(payload.quiz_placement, Some(QuizPlacement::After));
    }

    #[test]
    fn quiz_question_checks_answer() {
        let question = QuizQuestion {
            prompt: "Big-O of binary search?".into(),
            options: vec!["O(n)".into(), "O(log n)".into()],
            correct_option: 1,
        };
        assert!(question.is_correct(1));
        assert!(!question.is_correct(0));
    }
}
