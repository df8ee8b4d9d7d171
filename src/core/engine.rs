//! The adaptive session engine. Owns the session lifecycle: create, answer,
//! and the caller-driven finalize that archives a completed session. All
//! durable state lives in the store; the engine itself is stateless between
//! calls.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::core::competence;
use crate::core::types::{
    AnsweredQuestion, ContentStep, NextStep, Progress, Question, QuizHistoryRecord, Session, Tier,
};
use crate::db::{SessionStore, StoreError};
use crate::services::generation::QuestionGenerator;

/// Below this competence, a miss branches into a remediation-content step.
const REMEDIATION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("session has no pending question: {0}")]
    CorruptSession(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything the client needs after an answer, alongside the updated
/// session the boundary layer uses to decide on archival.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub explanation: String,
    pub correct_index: usize,
    pub next_step: NextStep,
    pub progress: Progress,
}

#[derive(Clone)]
pub struct QuizEngine {
    store: Arc<SessionStore>,
    generator: QuestionGenerator,
}

impl QuizEngine {
    pub fn new(store: Arc<SessionStore>, generator: QuestionGenerator) -> Self {
        Self { store, generator }
    }

    /// Starts a session: fresh id, easy first question, checkpoint.
    pub async fn create(
        &self,
        user_id: &str,
        topic: &str,
        course: &str,
        total_questions: u32,
    ) -> Result<Session, EngineError> {
        let first_question = self.generator.question(Tier::Easy, topic, course).await;

        let session = Session {
            session_id: new_session_id(),
            user_id: user_id.to_string(),
            topic: topic.to_string(),
            course: course.to_string(),
            progress: Progress::new(total_questions),
            last_question: Some(first_question),
        };

        self.store.save_session(&session).await?;
        info!(session_id = %session.session_id, user_id, topic, total_questions, "session created");
        Ok(session)
    }

    /// Processes one answer: competence update, difficulty selection,
    /// question-or-content branching, history append, checkpoint.
    ///
    /// An out-of-range index counts as incorrect; the only surfaced error
    /// for a well-formed request is `SessionNotFound`.
    pub async fn answer(
        &self,
        session_id: &str,
        answer_index: i64,
        time_taken: Option<f64>,
    ) -> Result<(Session, AnswerOutcome), EngineError> {
        let mut session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;

        let question = session
            .last_question
            .clone()
            .ok_or_else(|| EngineError::CorruptSession(session_id.to_string()))?;

        let is_correct =
            answer_index >= 0 && (answer_index as usize) == question.correct_index;

        let (updated_map, next_level) = competence::update(
            &session.progress.competence_map,
            &question.skill,
            question.difficulty,
            is_correct,
        );
        let skill_competence = updated_map
            .get(&question.skill)
            .copied()
            .unwrap_or(competence::UNSEEN_COMPETENCE);
        session.progress.competence_map = updated_map;
        session.progress.level = next_level;

        let (explanation, next_step) = if is_correct {
            session.progress.score += competence::score_increment(question.difficulty);
            let next_question = self.next_question(&session, next_level).await;
            (
                "Correct! Let's keep going.".to_string(),
                NextStep::Question(next_question),
            )
        } else {
            let correct_text = question.correct_text().to_string();
            let explanation =
                format!("Not quite. The correct answer was **{correct_text}**.");

            if skill_competence < REMEDIATION_THRESHOLD {
                // Weak skill: remediate, and prefetch the next question so
                // the client can continue directly after reviewing.
                let content = self.generator.content(&question.text, &correct_text).await;
                let next_question = self.next_question(&session, next_level).await;
                let step = NextStep::Content(ContentStep {
                    title: format!("Reviewing: {}", question.skill),
                    content,
                    next_question,
                });
                (explanation, step)
            } else {
                let next_question = self.next_question(&session, next_level).await;
                (explanation, NextStep::Question(next_question))
            }
        };

        session.progress.question_history.push(AnsweredQuestion {
            question: question.clone(),
            chosen_index: answer_index,
            is_correct,
            time_taken,
        });
        session.last_question = Some(next_step.pending_question().clone());
        session.progress.answered += 1;

        self.store.save_session(&session).await?;

        let outcome = AnswerOutcome {
            correct: is_correct,
            explanation,
            correct_index: question.correct_index,
            next_step,
            progress: session.progress.clone(),
        };
        Ok((session, outcome))
    }

    /// Terminal transition: once `answered` reaches the target, archive the
    /// final progress to history and drop the active session. Returns
    /// whether archival happened.
    pub async fn finalize_if_complete(&self, session: &Session) -> Result<bool, EngineError> {
        if !session.progress.is_complete() {
            return Ok(false);
        }

        let record = QuizHistoryRecord {
            user_id: session.user_id.clone(),
            session_id: session.session_id.clone(),
            course: session.course.clone(),
            topic: session.topic.clone(),
            progress: session.progress.clone(),
            completed_at: Utc::now(),
        };
        self.store.insert_history(&record).await?;
        self.store.delete_session(&session.session_id).await?;
        info!(session_id = %session.session_id, score = session.progress.score, "session archived");
        Ok(true)
    }

    pub async fn progress(&self, session_id: &str) -> Result<Progress, EngineError> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
        Ok(session.progress)
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<QuizHistoryRecord>, EngineError> {
        Ok(self.store.history_for_user(user_id).await?)
    }

    async fn next_question(&self, session: &Session, level: Tier) -> Question {
        self.generator
            .question(level, &session.topic, &session.course)
            .await
    }
}

/// Monotonic component plus a random component keeps collision probability
/// negligible across concurrently active sessions.
fn new_session_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("sess_{}_{}", Utc::now().timestamp(), &random[..6])
}
