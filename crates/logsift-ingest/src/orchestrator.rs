// Ingestion orchestrator
// Load parsed logs -> run rule engine -> embed alert summaries -> persist alerts + embeddings

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use logsift_core::{Alert, AlertRecord, EmbeddingDocument, LogEntry};
use logsift_rules::AlertRuleEngine;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::IngestConfig;
use crate::embedding::{provider_from_config, EmbeddingError, EmbeddingProvider};
use crate::error::IngestError;
use crate::store::ProjectStore;

type ProjectKey = (String, String);

/// Why an ingestion run did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyIngested,
    EmbeddingsNotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Skipped(SkipReason),
    NoAlerts,
    Completed { alerts: usize, embeddings: usize },
}

pub struct IngestOrchestrator {
    store: Arc<dyn ProjectStore>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    engine: AlertRuleEngine,
    // one async mutex per (user, project) currently being ingested
    locks: Mutex<HashMap<ProjectKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl IngestOrchestrator {
    /// `embedder = None` means embeddings are not configured; every run is a no-op
    pub fn new(
        store: Arc<dyn ProjectStore>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        engine: AlertRuleEngine,
    ) -> Self {
        Self {
            store,
            embedder,
            engine,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(
        config: &IngestConfig,
        store: Arc<dyn ProjectStore>,
    ) -> Result<Self, IngestError> {
        let engine = AlertRuleEngine::from_rule_set(&config.rules)?;

        let embedder = provider_from_config(&config.embedding)?;
        match &embedder {
            Some(provider) => info!(
                provider = provider.provider(),
                model = provider.model(),
                "Embedding provider configured"
            ),
            None => warn!("No embedding model configured, ingestion will be skipped"),
        }

        Ok(Self::new(store, embedder, engine))
    }

    pub fn engine(&self) -> &AlertRuleEngine {
        &self.engine
    }

    pub fn embedder(&self) -> Option<Arc<dyn EmbeddingProvider>> {
        self.embedder.clone()
    }

    /// Ingest a project at most once.
    ///
    /// Runs for the same project are serialized; a run that finds existing
    /// embedding documents returns `Skipped(AlreadyIngested)` without writing.
    pub async fn ingest_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<IngestOutcome, IngestError> {
        let key = (user_id.to_string(), project_id.to_string());
        let lock = self.acquire_slot(&key);

        let outcome = {
            let _guard = lock.lock().await;
            self.run(user_id, project_id).await
        };

        self.release_slot(&key, lock);

        match &outcome {
            Ok(result) => info!(user_id, project_id, outcome = ?result, "Ingestion finished"),
            Err(e) => error!(user_id, project_id, error = %e, "Ingestion failed"),
        }
        outcome
    }

    /// Run ingestion on a background task so callers do not wait for it
    pub fn spawn_ingestion(
        self: &Arc<Self>,
        user_id: String,
        project_id: String,
    ) -> JoinHandle<Result<IngestOutcome, IngestError>> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.ingest_project(&user_id, &project_id).await })
    }

    async fn run(&self, user_id: &str, project_id: &str) -> Result<IngestOutcome, IngestError> {
        if self.store.count_embeddings(user_id, project_id).await? > 0 {
            return Ok(IngestOutcome::Skipped(SkipReason::AlreadyIngested));
        }

        let Some(embedder) = &self.embedder else {
            return Ok(IngestOutcome::Skipped(SkipReason::EmbeddingsNotConfigured));
        };

        let files = self.store.list_files(user_id, project_id).await?;
        let entries: Vec<LogEntry> = files.into_iter().flat_map(|f| f.entries).collect();
        info!(user_id, project_id, entries = entries.len(), "Evaluating project logs");

        let alerts = self.engine.evaluate(&entries);
        if alerts.is_empty() {
            return Ok(IngestOutcome::NoAlerts);
        }

        // embed first: a provider failure leaves nothing behind
        let texts: Vec<String> = alerts.iter().map(render_summary).collect();
        let vectors = embedder.embed_documents(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            }
            .into());
        }

        let documents: Vec<EmbeddingDocument> = alerts
            .iter()
            .zip(texts)
            .zip(vectors)
            .map(|((alert, text), embedding)| EmbeddingDocument {
                user_id: user_id.to_string(),
                project_id: project_id.to_string(),
                alert_name: alert.name.clone(),
                severity: alert.severity,
                reason: alert.reason.clone(),
                text,
                embedding,
            })
            .collect();

        let records: Vec<AlertRecord> = alerts
            .into_iter()
            .map(|alert| AlertRecord::new(alert, user_id, project_id))
            .collect();

        let alert_count = records.len();
        let embedding_count = documents.len();

        self.store.insert_alerts(records).await?;
        self.store.insert_embeddings(documents).await?;

        Ok(IngestOutcome::Completed {
            alerts: alert_count,
            embeddings: embedding_count,
        })
    }

    fn acquire_slot(&self, key: &ProjectKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    // drop the map entry once nobody else is waiting on it
    fn release_slot(&self, key: &ProjectKey, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }
}

/// One-line text embedded for an alert
pub fn render_summary(alert: &Alert) -> String {
    format!(
        "[ALERT] {} (Severity: {}) - Reason: {} - Triggered by {} logs. Example log: {}",
        alert.name,
        alert.severity,
        alert.reason,
        alert.stats.count,
        alert.latest_message().unwrap_or("No recent log"),
    )
}
