mod health;
mod quiz;

use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/start", post(quiz::start))
        .route("/answer", post(quiz::answer))
        .route("/progress/:session_id", get(quiz::progress))
        .route("/history/:user_id", get(quiz::history))
        .merge(health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn welcome() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Welcome to the Adaptive Micro-Learning Engine API"
    }))
}

async fn fallback_handler() -> AppError {
    AppError::not_found("Resource not found")
}
