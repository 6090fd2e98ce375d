mod config;
mod handlers;
mod middleware;
mod models;
mod routes;
mod state;

use axum::http::HeaderValue;
use logsift_ingest::{IngestOrchestrator, MemoryStore, ProjectStore, chat_client_from_config};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    //logging setup
    tracing_subscriber::fmt::init();

    let config = ApiConfig::from_env()?;

    info!(rules = config.ingest.rules.rules.len(), "Setting up ingestion...");
    let store: Arc<dyn ProjectStore> = Arc::new(MemoryStore::new());
    let orchestrator = Arc::new(IngestOrchestrator::from_config(
        &config.ingest,
        store.clone(),
    )?);
    for rule in orchestrator.engine().rules() {
        info!(
            rule = %rule.name(),
            window = rule.time_window_minutes(),
            threshold = rule.threshold(),
            "Rule loaded"
        );
    }

    let chat_client = chat_client_from_config(&config.ingest.chat);
    let state = Arc::new(AppState::new(
        store,
        orchestrator,
        chat_client,
        config.api_key.clone(),
    ));

    if state.retriever.is_none() {
        info!("Alert search DISABLED (no embedding provider)");
    }
    if state.chat.is_none() {
        info!("Chat DISABLED (needs HF_CHAT_MODEL and an embedding provider)");
    }

    if config.api_key.is_some() {
        info!("API key authentication ENABLED");
    } else {
        info!("API key authentication DISABLED (set LOGSIFT_API_KEY to enable)");
    }

    let cors = match &config.cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    let app = routes::router(state).layer(cors);

    // Server start
    info!("Starting server on {}", config.bind);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
