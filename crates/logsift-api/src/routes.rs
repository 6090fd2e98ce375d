use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::handlers::{
    chat_with_project, create_project, ingest_project, list_projects, project_alerts,
    project_logs, search_alerts,
};
use crate::middleware::require_api_key;
use crate::state::AppState;

// several files per upload, each capped separately
const MAX_BODY_BYTES: usize = 128 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/{project_id}/logs", get(project_logs))
        .route("/api/projects/{project_id}/alerts", get(project_alerts))
        .route("/api/projects/{project_id}/ingest", post(ingest_project))
        .route("/api/projects/{project_id}/search", get(search_alerts))
        .route("/api/projects/{project_id}/chat", post(chat_with_project))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    // Health endpoint without auth
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(protected_routes)
        .with_state(state)
}
