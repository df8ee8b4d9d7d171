//! Question and remediation-content generation. Backends may fail; the
//! [`QuestionGenerator`] wrapper never does — any failure degrades to a
//! deterministic fallback so the learner's flow is never interrupted.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::core::types::{Question, Tier};
use crate::services::llm_provider::{LLMError, LLMProvider};
use crate::services::prompts;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LLMError),
    #[error("no JSON object found in model output")]
    MissingJson,
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model output missing or invalid: {0}")]
    Incomplete(&'static str),
}

/// A provider capable of producing questions and remediation content.
/// Swapping providers is a constructor-time choice on [`QuestionGenerator`].
pub trait GenerationBackend: Send + Sync {
    fn generate_question<'a>(
        &'a self,
        difficulty: Tier,
        topic: &'a str,
        course: &'a str,
    ) -> BoxFuture<'a, Result<Question, GenerationError>>;

    fn generate_content<'a>(
        &'a self,
        question_text: &'a str,
        correct_answer: &'a str,
    ) -> BoxFuture<'a, Result<String, GenerationError>>;
}

/// Shape the model is prompted to return.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    text: String,
    #[serde(default)]
    skill: Option<String>,
    #[serde(default)]
    correct_answer: String,
    #[serde(default)]
    distractors: Vec<String>,
}

/// Chat-model backed generation.
pub struct LlmGeneration {
    provider: LLMProvider,
}

impl LlmGeneration {
    pub fn from_env() -> Self {
        Self {
            provider: LLMProvider::from_env(),
        }
    }

    pub fn new(provider: LLMProvider) -> Self {
        Self { provider }
    }
}

impl GenerationBackend for LlmGeneration {
    fn generate_question<'a>(
        &'a self,
        difficulty: Tier,
        topic: &'a str,
        course: &'a str,
    ) -> BoxFuture<'a, Result<Question, GenerationError>> {
        Box::pin(async move {
            let prompt = prompts::question_prompt(difficulty, topic, course);
            let reply = self
                .provider
                .complete(prompts::QUESTION_SYSTEM, &prompt)
                .await?;
            let json = extract_json(&reply).ok_or(GenerationError::MissingJson)?;
            let raw: RawQuestion = serde_json::from_str(json)?;
            assemble_question(raw, difficulty, topic)
        })
    }

    fn generate_content<'a>(
        &'a self,
        question_text: &'a str,
        correct_answer: &'a str,
    ) -> BoxFuture<'a, Result<String, GenerationError>> {
        Box::pin(async move {
            let prompt = prompts::content_prompt(question_text, correct_answer);
            let reply = self.provider.complete("You are a concise tutor.", &prompt).await?;
            let reply = reply.trim().to_string();
            if reply.is_empty() {
                return Err(GenerationError::Incomplete("empty explanation"));
            }
            Ok(reply)
        })
    }
}

/// Deterministic offline backend used by tests and local development.
pub struct MockGeneration;

impl GenerationBackend for MockGeneration {
    fn generate_question<'a>(
        &'a self,
        difficulty: Tier,
        topic: &'a str,
        _course: &'a str,
    ) -> BoxFuture<'a, Result<Question, GenerationError>> {
        Box::pin(async move {
            Ok(Question {
                id: Uuid::new_v4().to_string(),
                text: format!("Which statement best describes {topic}? ({difficulty})"),
                options: vec![
                    format!("The accepted definition of {topic}"),
                    "A common misconception".to_string(),
                    "An unrelated concept".to_string(),
                    "A partially correct statement".to_string(),
                ],
                correct_index: 0,
                difficulty,
                skill: format!("{topic} fundamentals"),
            })
        })
    }

    fn generate_content<'a>(
        &'a self,
        question_text: &'a str,
        correct_answer: &'a str,
    ) -> BoxFuture<'a, Result<String, GenerationError>> {
        Box::pin(async move {
            Ok(format!(
                "Let's review this concept. The correct answer to '{question_text}' is **{correct_answer}**."
            ))
        })
    }
}

/// Infallible front door for generation. Backend failures and malformed
/// output are logged and replaced with deterministic fallbacks.
#[derive(Clone)]
pub struct QuestionGenerator {
    backend: Arc<dyn GenerationBackend>,
}

impl QuestionGenerator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub fn from_env() -> Self {
        Self::new(Arc::new(LlmGeneration::from_env()))
    }

    pub fn mock() -> Self {
        Self::new(Arc::new(MockGeneration))
    }

    pub async fn question(&self, difficulty: Tier, topic: &str, course: &str) -> Question {
        match self.backend.generate_question(difficulty, topic, course).await {
            Ok(question) if question.is_well_formed() => question,
            Ok(_) => {
                warn!(%difficulty, topic, "generated question malformed, using fallback");
                fallback_question(difficulty, topic)
            }
            Err(err) => {
                warn!(error = %err, %difficulty, topic, "question generation failed, using fallback");
                fallback_question(difficulty, topic)
            }
        }
    }

    pub async fn content(&self, question_text: &str, correct_answer: &str) -> String {
        match self
            .backend
            .generate_content(question_text, correct_answer)
            .await
        {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "content generation failed, using fallback");
                fallback_content(question_text, correct_answer)
            }
        }
    }
}

/// Minimal deterministic question for the requested difficulty and topic.
pub fn fallback_question(difficulty: Tier, topic: &str) -> Question {
    Question {
        id: Uuid::new_v4().to_string(),
        text: format!("What is a key concept in {topic}?"),
        options: vec![
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
            "D".to_string(),
        ],
        correct_index: 0,
        difficulty,
        skill: topic.to_string(),
    }
}

pub fn fallback_content(question_text: &str, correct_answer: &str) -> String {
    format!(
        "Let's review this concept. The correct answer to '{question_text}' is **{correct_answer}**."
    )
}

/// Pulls the outermost `{...}` block out of a model reply that may carry
/// prose or code fences around it.
fn extract_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Strips leading "A.", "b)", "3)" style markers the model sometimes emits.
fn clean_choice(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    if let (Some(first), Some(second)) = (chars.next(), chars.next()) {
        if matches!(first, 'A'..='D' | 'a'..='d' | '1'..='4') && matches!(second, '.' | ')') {
            return chars.as_str().trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Cleans every option and drops empties and case-insensitive duplicates,
/// preserving first-seen order.
fn normalize_unique(options: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for option in options {
        let cleaned = clean_choice(option);
        let key = cleaned.to_lowercase();
        if cleaned.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(cleaned);
    }
    out
}

fn assemble_question(
    raw: RawQuestion,
    difficulty: Tier,
    topic: &str,
) -> Result<Question, GenerationError> {
    let text = raw.text.trim().to_string();
    if text.is_empty() {
        return Err(GenerationError::Incomplete("missing question text"));
    }

    let correct = clean_choice(&raw.correct_answer);
    if correct.is_empty() {
        return Err(GenerationError::Incomplete("missing correct answer"));
    }

    let correct_key = correct.to_lowercase();
    let distractors: Vec<String> = normalize_unique(&raw.distractors)
        .into_iter()
        .filter(|d| d.to_lowercase() != correct_key)
        .collect();
    if distractors.len() < 3 {
        return Err(GenerationError::Incomplete("fewer than 3 distinct distractors"));
    }

    let mut options: Vec<String> = std::iter::once(correct.clone())
        .chain(distractors.into_iter().take(3))
        .collect();
    options.shuffle(&mut rand::rng());
    let correct_index = options
        .iter()
        .position(|o| o.to_lowercase() == correct_key)
        .ok_or(GenerationError::Incomplete("correct answer lost in shuffle"))?;

    let skill = raw
        .skill
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| topic.to_string());

    Ok(Question {
        id: Uuid::new_v4().to_string(),
        text,
        options,
        correct_index,
        difficulty,
        skill,
    })
}
