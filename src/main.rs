use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use microlearn_backend::config::Config;
use microlearn_backend::db;
use microlearn_backend::logging;
use microlearn_backend::routes;
use microlearn_backend::services::generation::QuestionGenerator;
use microlearn_backend::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.log_level);

    let pool = match db::connect(&config.database_url).await {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!(error = %err, url = %config.database_url, "failed to open session store");
            return;
        }
    };
    let store = Arc::new(db::SessionStore::new(pool));

    let generator = if config.llm_mock {
        tracing::warn!("mock generation backend enabled, no LLM calls will be made");
        QuestionGenerator::mock()
    } else {
        QuestionGenerator::from_env()
    };

    let state = AppState::new(store, generator);
    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr();
    tracing::info!(%addr, "microlearn-backend listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
