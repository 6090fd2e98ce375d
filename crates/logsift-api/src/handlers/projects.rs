use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use crate::handlers::ensure_project;
use crate::middleware::UserId;
use crate::models::{
    ApiError, CreateProjectResponse, LogFileItem, ProjectListItem, ProjectLogsResponse,
    ProjectsResponse, store_error,
};
use crate::state::AppState;

pub const MAX_LOG_FILE_BYTES: usize = 15 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
    InvalidPayload,
    InvalidLogFile,
}

impl UploadError {
    fn into_api_error(self) -> (StatusCode, Json<ApiError>) {
        match self {
            UploadError::InvalidPayload => ApiError::bad_request("Invalid payload"),
            UploadError::InvalidLogFile => ApiError::bad_request("Invalid log file"),
        }
    }
}

pub struct UploadedFile {
    pub filename: Option<String>,
    pub content: Bytes,
}

/// Trimmed project name; empty names are rejected
pub fn clean_project_name(name: &str) -> Result<String, UploadError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UploadError::InvalidPayload);
    }
    Ok(name.to_string())
}

pub fn validate_log_file(filename: Option<&str>, size: usize) -> Result<(), UploadError> {
    let filename = filename.unwrap_or("");
    if !filename.to_lowercase().ends_with(".log") || size > MAX_LOG_FILE_BYTES {
        return Err(UploadError::InvalidLogFile);
    }
    Ok(())
}

pub fn validate_upload(name: &str, files: &[UploadedFile]) -> Result<String, UploadError> {
    let name = clean_project_name(name)?;
    if files.is_empty() {
        return Err(UploadError::InvalidPayload);
    }
    for file in files {
        validate_log_file(file.filename.as_deref(), file.content.len())?;
    }
    Ok(name)
}

// POST /api/projects (multipart: name + files)
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateProjectResponse>), (StatusCode, Json<ApiError>)> {
    let mut name = String::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => {
                name = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
            }
            Some("files") => {
                let filename = field.file_name().map(str::to_string);
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
                files.push(UploadedFile { filename, content });
            }
            _ => {}
        }
    }

    let name = validate_upload(&name, &files).map_err(UploadError::into_api_error)?;

    let project = state
        .store
        .create_project(&user_id, &name)
        .await
        .map_err(store_error)?;

    for file in files {
        let text = String::from_utf8_lossy(&file.content);
        let entries = state.parser.parse_text(&text);
        let filename = file.filename.unwrap_or_else(|| "unknown.log".to_string());
        info!(
            project_id = %project.id,
            filename = %filename,
            entries = entries.len(),
            "Stored log file"
        );

        state
            .store
            .add_file_logs(&user_id, &project.id, &filename, entries)
            .await
            .map_err(store_error)?;
    }

    // fire and forget, progress shows up in the logs
    state
        .orchestrator
        .spawn_ingestion(user_id.clone(), project.id.clone());

    Ok((
        StatusCode::CREATED,
        Json(CreateProjectResponse {
            project_id: project.id,
            embedding_started: true,
        }),
    ))
}

// GET /api/projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> Result<Json<ProjectsResponse>, (StatusCode, Json<ApiError>)> {
    let projects = state
        .store
        .list_projects(&user_id)
        .await
        .map_err(store_error)?;

    Ok(Json(ProjectsResponse {
        projects: projects.into_iter().map(ProjectListItem::from).collect(),
    }))
}

// GET /api/projects/{project_id}/logs
pub async fn project_logs(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectLogsResponse>, (StatusCode, Json<ApiError>)> {
    ensure_project(&state, &user_id, &project_id).await?;

    let files = state
        .store
        .list_files(&user_id, &project_id)
        .await
        .map_err(store_error)?;

    Ok(Json(ProjectLogsResponse {
        project_id,
        files: files.into_iter().map(LogFileItem::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: Option<&str>, size: usize) -> UploadedFile {
        UploadedFile {
            filename: name.map(str::to_string),
            content: Bytes::from(vec![b'a'; size]),
        }
    }

    #[test]
    fn test_project_name_is_trimmed() {
        assert_eq!(clean_project_name("  checkout  ").unwrap(), "checkout");
        assert_eq!(clean_project_name("   "), Err(UploadError::InvalidPayload));
    }

    #[test]
    fn test_log_extension_required() {
        assert!(validate_log_file(Some("app.log"), 10).is_ok());
        assert!(validate_log_file(Some("APP.LOG"), 10).is_ok());
        assert_eq!(validate_log_file(Some("app.txt"), 10), Err(UploadError::InvalidLogFile));
        assert_eq!(validate_log_file(None, 10), Err(UploadError::InvalidLogFile));
    }

    #[test]
    fn test_size_limit() {
        assert!(validate_log_file(Some("big.log"), MAX_LOG_FILE_BYTES).is_ok());
        assert_eq!(
            validate_log_file(Some("big.log"), MAX_LOG_FILE_BYTES + 1),
            Err(UploadError::InvalidLogFile)
        );
    }

    #[test]
    fn test_upload_needs_files() {
        assert_eq!(validate_upload("checkout", &[]), Err(UploadError::InvalidPayload));
        assert_eq!(
            validate_upload("checkout", &[file(Some("a.log"), 1), file(Some("b.csv"), 1)]),
            Err(UploadError::InvalidLogFile)
        );
        assert_eq!(
            validate_upload(" checkout ", &[file(Some("a.log"), 1)]).unwrap(),
            "checkout"
        );
    }
}
