use axum::{Json, http::StatusCode};
use logsift_core::{AlertRecord, LogEntry, Severity};
use logsift_ingest::{
    ChatAnswer, IngestError, IngestOutcome, Project, ProjectLogFile, SkipReason, StoreError,
};
use serde::Serialize;

/// JSON error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: u16,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                error: message.into(),
                code: status.as_u16(),
            }),
        )
    }

    pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unavailable(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn store_error(e: StoreError) -> (StatusCode, Json<ApiError>) {
    match e {
        StoreError::ProjectNotFound(_) => ApiError::not_found("Project not found"),
        other => ApiError::internal(other.to_string()),
    }
}

pub fn ingest_error(e: IngestError) -> (StatusCode, Json<ApiError>) {
    match e {
        IngestError::Store(e) => store_error(e),
        IngestError::Embedding(e) => ApiError::new(StatusCode::BAD_GATEWAY, e.to_string()),
        IngestError::Rules(e) => ApiError::internal(e.to_string()),
        IngestError::Chat(e) if e.is_invalid_request() => ApiError::bad_request(e.to_string()),
        IngestError::Chat(e) => ApiError::new(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

#[derive(Serialize)]
pub struct CreateProjectResponse {
    pub project_id: String,
    pub embedding_started: bool,
}

#[derive(Serialize)]
pub struct ProjectListItem {
    pub project_id: String,
    pub name: String,
    pub created_at: String,
}

impl From<Project> for ProjectListItem {
    fn from(p: Project) -> Self {
        Self {
            project_id: p.id,
            name: p.name,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<ProjectListItem>,
}

#[derive(Serialize)]
pub struct LogFileItem {
    pub filename: String,
    pub created_at: String,
    pub logs: Vec<LogEntry>,
}

impl From<ProjectLogFile> for LogFileItem {
    fn from(f: ProjectLogFile) -> Self {
        Self {
            filename: f.filename,
            created_at: f.created_at.to_rfc3339(),
            logs: f.entries,
        }
    }
}

#[derive(Serialize)]
pub struct ProjectLogsResponse {
    pub project_id: String,
    pub files: Vec<LogFileItem>,
}

#[derive(Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertRecord>,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub alerts: usize,
    pub embeddings: usize,
}

impl From<IngestOutcome> for IngestResponse {
    fn from(outcome: IngestOutcome) -> Self {
        let (status, alerts, embeddings) = match outcome {
            IngestOutcome::Skipped(SkipReason::AlreadyIngested) => ("already_ingested", 0, 0),
            IngestOutcome::Skipped(SkipReason::EmbeddingsNotConfigured) => ("not_configured", 0, 0),
            IngestOutcome::NoAlerts => ("no_alerts", 0, 0),
            IngestOutcome::Completed { alerts, embeddings } => ("completed", alerts, embeddings),
        };
        Self {
            status,
            alerts,
            embeddings,
        }
    }
}

#[derive(Serialize)]
pub struct SearchResult {
    pub score: f32,
    pub alert_name: String,
    pub severity: Severity,
    pub reason: String,
    pub text: String,
}

#[derive(Serialize)]
pub struct ChatContext {
    pub text: String,
    pub score: f32,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub context: Vec<ChatContext>,
}

impl From<ChatAnswer> for ChatResponse {
    fn from(answer: ChatAnswer) -> Self {
        Self {
            response: answer.response,
            context: answer
                .context
                .into_iter()
                .map(|scored| ChatContext {
                    text: scored.document.text,
                    score: scored.score,
                })
                .collect(),
        }
    }
}
