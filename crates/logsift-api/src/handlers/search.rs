use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use crate::handlers::ensure_project;
use crate::middleware::UserId;
use crate::models::{ApiError, SearchQuery, SearchResult, ingest_error};
use crate::state::AppState;

const MAX_SEARCH_LIMIT: usize = 50;

// GET /api/projects/{project_id}/search?q=...&limit=5
pub async fn search_alerts(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(project_id): Path<String>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResult>>, (StatusCode, Json<ApiError>)> {
    let Some(retriever) = &state.retriever else {
        return Err(ApiError::unavailable("Embeddings are not configured"));
    };

    let query = params.q.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("Query must not be empty"));
    }

    ensure_project(&state, &user_id, &project_id).await?;

    info!(project_id = %project_id, query = %query, limit = params.limit, "Search request");

    let results = retriever
        .search(&user_id, &project_id, query, params.limit.min(MAX_SEARCH_LIMIT))
        .await
        .map_err(ingest_error)?;

    let results: Vec<SearchResult> = results
        .into_iter()
        .map(|scored| SearchResult {
            score: scored.score,
            alert_name: scored.document.alert_name,
            severity: scored.document.severity,
            reason: scored.document.reason,
            text: scored.document.text,
        })
        .collect();

    info!(results = results.len(), "Search Complete");
    Ok(Json(results))
}
