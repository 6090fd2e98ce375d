use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use logsift_ingest::last_user_query;
use std::sync::Arc;
use tracing::info;

use crate::handlers::ensure_project;
use crate::middleware::UserId;
use crate::models::{ApiError, ChatRequest, ChatResponse, ingest_error};
use crate::state::AppState;

// POST /api/projects/{project_id}/chat
pub async fn chat_with_project(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(project_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ApiError>)> {
    // malformed conversations are rejected before anything else
    last_user_query(&request.messages).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let Some(chat) = &state.chat else {
        return Err(ApiError::unavailable("Chat is not configured"));
    };

    ensure_project(&state, &user_id, &project_id).await?;

    info!(project_id = %project_id, turns = request.messages.len(), "Chat request");

    let answer = chat
        .answer(&user_id, &project_id, &request.messages)
        .await
        .map_err(ingest_error)?;

    info!(context = answer.context.len(), "Chat Complete");
    Ok(Json(answer.into()))
}
