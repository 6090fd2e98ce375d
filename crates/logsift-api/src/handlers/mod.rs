mod alerts;
mod chat;
mod ingest;
mod projects;
mod search;

pub use alerts::*;
pub use chat::*;
pub use ingest::*;
pub use projects::*;
pub use search::*;

use axum::{Json, http::StatusCode};

use crate::models::{ApiError, store_error};
use crate::state::AppState;

/// 404 unless the project exists for this user
pub async fn ensure_project(
    state: &AppState,
    user_id: &str,
    project_id: &str,
) -> Result<(), (StatusCode, Json<ApiError>)> {
    match state.store.find_project(user_id, project_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(ApiError::not_found("Project not found")),
        Err(e) => Err(store_error(e)),
    }
}
