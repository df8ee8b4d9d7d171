pub mod config;
pub mod core;
pub mod db;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::SessionStore;
use crate::services::generation::QuestionGenerator;
use crate::state::AppState;

/// Builds the full application router from environment configuration.
/// Integration tests drive this directly with an in-memory store.
pub async fn create_app() -> Result<axum::Router, sqlx::Error> {
    let config = Config::from_env();
    let pool = db::connect(&config.database_url).await?;
    let store = Arc::new(SessionStore::new(pool));

    let generator = if config.llm_mock {
        QuestionGenerator::mock()
    } else {
        QuestionGenerator::from_env()
    };

    let state = AppState::new(store, generator);
    Ok(routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
