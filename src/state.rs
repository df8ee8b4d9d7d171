use std::sync::Arc;
use std::time::Instant;

use crate::core::engine::QuizEngine;
use crate::db::SessionStore;
use crate::services::generation::QuestionGenerator;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    engine: Arc<QuizEngine>,
}

impl AppState {
    pub fn new(store: Arc<SessionStore>, generator: QuestionGenerator) -> Self {
        Self {
            started_at: Instant::now(),
            engine: Arc::new(QuizEngine::new(store, generator)),
        }
    }

    pub fn engine(&self) -> Arc<QuizEngine> {
        Arc::clone(&self.engine)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
