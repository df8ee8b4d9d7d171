use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::types::{Progress, Question, QuizHistoryRecord};
use crate::response::AppError;
use crate::state::AppState;

const DEFAULT_NUM_QUESTIONS: u32 = 5;
const MAX_NUM_QUESTIONS: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    user_id: String,
    topic: String,
    course: String,
    num_questions: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    session_id: String,
    question: Question,
    progress: Progress,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    session_id: String,
    answer_index: i64,
    time_taken: Option<f64>,
}

pub async fn start(
    State(state): State<AppState>,
    Json(payload): Json<StartRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = payload.user_id.trim();
    let topic = payload.topic.trim();
    let course = payload.course.trim();
    if user_id.is_empty() || topic.is_empty() || course.is_empty() {
        return Err(AppError::validation(
            "user_id, topic and course must be non-empty",
        ));
    }

    let num_questions = payload.num_questions.unwrap_or(DEFAULT_NUM_QUESTIONS);
    if !(1..=MAX_NUM_QUESTIONS).contains(&num_questions) {
        return Err(AppError::validation(format!(
            "num_questions must be between 1 and {MAX_NUM_QUESTIONS}"
        )));
    }

    let session = state
        .engine()
        .create(user_id, topic, course, num_questions)
        .await?;

    let question = session
        .last_question
        .clone()
        .ok_or_else(|| AppError::internal("session created without a question"))?;

    Ok(Json(StartResponse {
        session_id: session.session_id,
        question,
        progress: session.progress,
    }))
}

pub async fn answer(
    State(state): State<AppState>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let engine = state.engine();
    let (session, outcome) = engine
        .answer(&payload.session_id, payload.answer_index, payload.time_taken)
        .await?;

    // Terminal transition: a completed session is archived and its id
    // becomes invalid for further calls.
    engine.finalize_if_complete(&session).await?;

    Ok(Json(outcome))
}

pub async fn progress(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Progress>, AppError> {
    Ok(Json(state.engine().progress(&session_id).await?))
}

pub async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<QuizHistoryRecord>>, AppError> {
    Ok(Json(state.engine().history(&user_id).await?))
}
