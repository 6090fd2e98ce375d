use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use crate::handlers::ensure_project;
use crate::middleware::UserId;
use crate::models::{AlertsResponse, ApiError, store_error};
use crate::state::AppState;

// GET /api/projects/{project_id}/alerts
pub async fn project_alerts(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(project_id): Path<String>,
) -> Result<Json<AlertsResponse>, (StatusCode, Json<ApiError>)> {
    ensure_project(&state, &user_id, &project_id).await?;

    let alerts = state
        .store
        .list_alerts(&user_id, &project_id)
        .await
        .map_err(store_error)?;

    info!(project_id = %project_id, count = alerts.len(), "Alerts returned");

    Ok(Json(AlertsResponse { alerts }))
}
