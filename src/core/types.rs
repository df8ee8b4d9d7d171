use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Question difficulty tier. Order matters: scoring weight and prompt
/// selection both derive from the tier index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

impl Tier {
    pub fn index(self) -> usize {
        match self {
            Tier::Easy => 0,
            Tier::Medium => 1,
            Tier::Hard => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Easy => "easy",
            Tier::Medium => "medium",
            Tier::Hard => "hard",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-skill competence scores in [0, 1]. A missing key means the skill has
/// not been probed yet and reads as 0.5.
pub type CompetenceMap = BTreeMap<String, f64>;

/// A single multiple-choice question. Immutable once created; the generation
/// layer guarantees exactly 4 unique, non-empty options with `correct_index`
/// pointing into them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub difficulty: Tier,
    pub skill: String,
}

impl Question {
    pub fn correct_text(&self) -> &str {
        self.options
            .get(self.correct_index)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Structural invariant used by the generation layer and its tests.
    pub fn is_well_formed(&self) -> bool {
        let mut seen: Vec<String> = Vec::with_capacity(self.options.len());
        for option in &self.options {
            let lowered = option.trim().to_lowercase();
            if lowered.is_empty() || seen.contains(&lowered) {
                return false;
            }
            seen.push(lowered);
        }
        self.options.len() == 4 && self.correct_index < self.options.len()
    }
}

/// Snapshot of one answered question, appended to the session history in
/// answer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question: Question,
    pub chosen_index: i64,
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<f64>,
}

/// Mutable per-session learning state. One Progress is owned by exactly one
/// session; the answer flow mutates it in place and checkpoints the whole
/// session afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub score: i64,
    pub answered: u32,
    pub total_questions: u32,
    pub level: Tier,
    pub competence_map: CompetenceMap,
    pub question_history: Vec<AnsweredQuestion>,
}

impl Progress {
    pub fn new(total_questions: u32) -> Self {
        Self {
            score: 0,
            answered: 0,
            total_questions,
            level: Tier::Easy,
            competence_map: CompetenceMap::new(),
            question_history: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.answered >= self.total_questions
    }
}

/// The unit of durable state. Checkpointed by full replace-by-id after every
/// mutation; deleted from the active store once complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub topic: String,
    pub course: String,
    pub progress: Progress,
    pub last_question: Option<Question>,
}

/// What the client should do after an answer: either a plain next question,
/// or a remediation step that embeds the next question so the client can
/// continue directly after reviewing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum NextStep {
    Question(Question),
    Content(ContentStep),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentStep {
    pub title: String,
    pub content: String,
    pub next_question: Question,
}

impl NextStep {
    /// The question now pending, regardless of step type.
    pub fn pending_question(&self) -> &Question {
        match self {
            NextStep::Question(q) => q,
            NextStep::Content(step) => &step.next_question,
        }
    }
}

/// Immutable archival record written exactly once per session, at finalize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizHistoryRecord {
    pub user_id: String,
    pub session_id: String,
    pub course: String,
    pub topic: String,
    pub progress: Progress,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], correct_index: usize) -> Question {
        Question {
            id: "q1".to_string(),
            text: "What is 7 x 6?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_index,
            difficulty: Tier::Easy,
            skill: "Multiplication".to_string(),
        }
    }

    #[test]
    fn well_formed_accepts_four_unique_options() {
        assert!(question(&["42", "35", "48", "54"], 0).is_well_formed());
    }

    #[test]
    fn well_formed_rejects_case_insensitive_duplicates() {
        assert!(!question(&["Tokyo", "tokyo", "Kyoto", "Osaka"], 0).is_well_formed());
    }

    #[test]
    fn well_formed_rejects_out_of_range_index() {
        assert!(!question(&["a", "b", "c", "d"], 4).is_well_formed());
    }

    #[test]
    fn next_step_serializes_with_type_tag() {
        let step = NextStep::Question(question(&["a", "b", "c", "d"], 1));
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["type"], "question");
        assert_eq!(value["data"]["correct_index"], 1);
    }

    #[test]
    fn tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Medium).unwrap(), "\"medium\"");
    }
}
