// Project storage contract and the bundled in-memory store
// Every query is scoped by (user_id, project_id).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use logsift_core::{AlertRecord, EmbeddingDocument, LogEntry};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Storage backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Parsed entries of one uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectLogFile {
    pub user_id: String,
    pub project_id: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<LogEntry>,
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create_project(&self, user_id: &str, name: &str) -> Result<Project, StoreError>;

    /// newest first
    async fn list_projects(&self, user_id: &str) -> Result<Vec<Project>, StoreError>;

    async fn find_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Option<Project>, StoreError>;

    async fn add_file_logs(
        &self,
        user_id: &str,
        project_id: &str,
        filename: &str,
        entries: Vec<LogEntry>,
    ) -> Result<ProjectLogFile, StoreError>;

    /// in upload order
    async fn list_files(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Vec<ProjectLogFile>, StoreError>;

    async fn insert_alerts(&self, records: Vec<AlertRecord>) -> Result<(), StoreError>;

    async fn list_alerts(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Vec<AlertRecord>, StoreError>;

    async fn count_embeddings(&self, user_id: &str, project_id: &str) -> Result<usize, StoreError>;

    async fn insert_embeddings(&self, documents: Vec<EmbeddingDocument>) -> Result<(), StoreError>;

    async fn list_embeddings(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Vec<EmbeddingDocument>, StoreError>;
}

// IN-MEMORY STORE

#[derive(Default)]
struct Collections {
    projects: Vec<Project>,
    files: Vec<ProjectLogFile>,
    alerts: Vec<AlertRecord>,
    embeddings: Vec<EmbeddingDocument>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every alert and embedding of a project so it can be ingested again
    pub async fn clear_ingestion(&self, user_id: &str, project_id: &str) {
        let mut inner = self.inner.write().await;
        inner
            .alerts
            .retain(|a| !(a.user_id == user_id && a.project_id == project_id));
        inner
            .embeddings
            .retain(|d| !(d.user_id == user_id && d.project_id == project_id));
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create_project(&self, user_id: &str, name: &str) -> Result<Project, StoreError> {
        let project = Project {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.inner.write().await.projects.push(project.clone());
        Ok(project)
    }

    async fn list_projects(&self, user_id: &str) -> Result<Vec<Project>, StoreError> {
        let inner = self.inner.read().await;
        let mut projects: Vec<Project> = inner
            .projects
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn find_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Option<Project>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .projects
            .iter()
            .find(|p| p.user_id == user_id && p.id == project_id)
            .cloned())
    }

    async fn add_file_logs(
        &self,
        user_id: &str,
        project_id: &str,
        filename: &str,
        entries: Vec<LogEntry>,
    ) -> Result<ProjectLogFile, StoreError> {
        let mut inner = self.inner.write().await;
        let exists = inner
            .projects
            .iter()
            .any(|p| p.user_id == user_id && p.id == project_id);
        if !exists {
            return Err(StoreError::ProjectNotFound(project_id.to_string()));
        }

        let file = ProjectLogFile {
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            filename: filename.to_string(),
            created_at: Utc::now(),
            entries,
        };
        inner.files.push(file.clone());
        Ok(file)
    }

    async fn list_files(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Vec<ProjectLogFile>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .files
            .iter()
            .filter(|f| f.user_id == user_id && f.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn insert_alerts(&self, records: Vec<AlertRecord>) -> Result<(), StoreError> {
        self.inner.write().await.alerts.extend(records);
        Ok(())
    }

    async fn list_alerts(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Vec<AlertRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .alerts
            .iter()
            .filter(|a| a.user_id == user_id && a.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn count_embeddings(&self, user_id: &str, project_id: &str) -> Result<usize, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .embeddings
            .iter()
            .filter(|d| d.user_id == user_id && d.project_id == project_id)
            .count())
    }

    async fn insert_embeddings(&self, documents: Vec<EmbeddingDocument>) -> Result<(), StoreError> {
        self.inner.write().await.embeddings.extend(documents);
        Ok(())
    }

    async fn list_embeddings(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Vec<EmbeddingDocument>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .embeddings
            .iter()
            .filter(|d| d.user_id == user_id && d.project_id == project_id)
            .cloned()
            .collect())
    }
}
