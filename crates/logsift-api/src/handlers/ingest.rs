use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::handlers::ensure_project;
use crate::middleware::UserId;
use crate::models::{ApiError, IngestResponse, ingest_error};
use crate::state::AppState;

/// Run ingestion in the request, e.g. to retry after a provider failure
// POST /api/projects/{project_id}/ingest
pub async fn ingest_project(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(project_id): Path<String>,
) -> Result<Json<IngestResponse>, (StatusCode, Json<ApiError>)> {
    ensure_project(&state, &user_id, &project_id).await?;

    let outcome = state
        .orchestrator
        .ingest_project(&user_id, &project_id)
        .await
        .map_err(ingest_error)?;

    Ok(Json(outcome.into()))
}
