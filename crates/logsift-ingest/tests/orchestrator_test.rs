use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use logsift_core::parser::parse_log_text;
use logsift_core::Severity;
use logsift_ingest::{
    AlertRetriever, EmbeddingError, EmbeddingProvider, IngestError, IngestOrchestrator,
    IngestOutcome, MemoryStore, ProjectStore, SkipReason,
};
use logsift_rules::{AlertRuleEngine, RuleSet};

const APP_LOG: &str = "\
2024-03-01 10:00:01 INFO 1 --- [main] com.acme.Application : Started
2024-03-01 10:00:05 ERROR 1 --- [exec-1] com.acme.OrderService : Payment declined
2024-03-01 10:03:10 WARN 1 --- [exec-2] com.acme.web.Filter : GET /favicon.ico status=404
";

const WORKER_LOG: &str = "\
2024-03-01 11:00:00 INFO 2 --- [worker] com.acme.Jobs : Failed to refresh cache
";

// Deterministic provider: vector = [len, count of 'e', 1.0]
struct FakeEmbedder {
    calls: AtomicUsize,
    delay: Duration,
    fail: bool,
}

impl FakeEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(EmbeddingError::ApiError {
                status: 503,
                body: "model loading".to_string(),
            });
        }
        Ok(texts
            .iter()
            .map(|t| vec![t.len() as f32, t.matches('e').count() as f32, 1.0])
            .collect())
    }

    fn model(&self) -> &str {
        "fake"
    }

    fn provider(&self) -> &str {
        "test"
    }
}

fn as_provider(embedder: &Arc<FakeEmbedder>) -> Option<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = embedder.clone();
    Some(provider)
}

fn default_engine() -> AlertRuleEngine {
    AlertRuleEngine::from_rule_set(&RuleSet::ingest_defaults()).unwrap()
}

async fn seeded_store() -> (Arc<MemoryStore>, String) {
    let store = Arc::new(MemoryStore::new());
    let project = store.create_project("alice", "shop").await.unwrap();
    store
        .add_file_logs("alice", &project.id, "app.log", parse_log_text(APP_LOG))
        .await
        .unwrap();
    store
        .add_file_logs("alice", &project.id, "worker.log", parse_log_text(WORKER_LOG))
        .await
        .unwrap();
    (store, project.id)
}

#[tokio::test]
async fn test_ingest_persists_alerts_and_embeddings() {
    let (store, project_id) = seeded_store().await;
    let embedder = Arc::new(FakeEmbedder::new());
    let orchestrator =
        IngestOrchestrator::new(store.clone(), as_provider(&embedder), default_engine());

    let outcome = orchestrator.ingest_project("alice", &project_id).await.unwrap();

    // ERROR line, the 404 line and the "Failed" line
    assert_eq!(
        outcome,
        IngestOutcome::Completed {
            alerts: 3,
            embeddings: 3
        }
    );
    assert_eq!(embedder.calls(), 1);

    let alerts = store.list_alerts("alice", &project_id).await.unwrap();
    let names: Vec<&str> = alerts.iter().map(|a| a.alert.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "High Error Rate",
            "Frequent Keyword: 'status=404'",
            "Frequent Keyword: 'Failed'",
        ]
    );
    assert_eq!(alerts[0].time_detected, "2024-03-01T10:00:00");
    assert_eq!(alerts[0].alert.severity, Severity::High);
    assert_eq!(alerts[1].alert.severity, Severity::Medium);
    assert_eq!(alerts[2].alert.triggering_logs[0].category, "Jobs");

    let documents = store.list_embeddings("alice", &project_id).await.unwrap();
    assert_eq!(documents.len(), 3);
    assert_eq!(documents[0].alert_name, "High Error Rate");
    assert!(documents[0].text.starts_with("[ALERT] High Error Rate (Severity: HIGH)"));
    assert!(documents[0].text.ends_with("Example log: Payment declined"));
    assert_eq!(documents[0].embedding.len(), 3);
}

#[tokio::test]
async fn test_second_ingestion_is_a_noop() {
    let (store, project_id) = seeded_store().await;
    let embedder = Arc::new(FakeEmbedder::new());
    let orchestrator =
        IngestOrchestrator::new(store.clone(), as_provider(&embedder), default_engine());

    orchestrator.ingest_project("alice", &project_id).await.unwrap();
    let second = orchestrator.ingest_project("alice", &project_id).await.unwrap();

    assert_eq!(second, IngestOutcome::Skipped(SkipReason::AlreadyIngested));
    assert_eq!(embedder.calls(), 1);
    assert_eq!(store.list_alerts("alice", &project_id).await.unwrap().len(), 3);
    assert_eq!(store.count_embeddings("alice", &project_id).await.unwrap(), 3);
}

#[tokio::test]
async fn test_cleared_project_can_be_ingested_again() {
    let (store, project_id) = seeded_store().await;
    let embedder = Arc::new(FakeEmbedder::new());
    let orchestrator =
        IngestOrchestrator::new(store.clone(), as_provider(&embedder), default_engine());

    orchestrator.ingest_project("alice", &project_id).await.unwrap();
    store.clear_ingestion("alice", &project_id).await;
    let again = orchestrator.ingest_project("alice", &project_id).await.unwrap();

    assert!(matches!(again, IngestOutcome::Completed { alerts: 3, .. }));
    assert_eq!(embedder.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_ingestion_of_same_project_runs_once() {
    let (store, project_id) = seeded_store().await;
    let embedder = Arc::new(FakeEmbedder {
        delay: Duration::from_millis(50),
        ..FakeEmbedder::new()
    });
    let orchestrator = Arc::new(IngestOrchestrator::new(
        store.clone(),
        as_provider(&embedder),
        default_engine(),
    ));

    let first = orchestrator.spawn_ingestion("alice".to_string(), project_id.clone());
    let second = orchestrator.spawn_ingestion("alice".to_string(), project_id.clone());
    let (first, second) = (first.await.unwrap().unwrap(), second.await.unwrap().unwrap());

    let completed = [&first, &second]
        .iter()
        .filter(|o| matches!(o, IngestOutcome::Completed { .. }))
        .count();
    assert_eq!(completed, 1);
    assert!(first == IngestOutcome::Skipped(SkipReason::AlreadyIngested)
        || second == IngestOutcome::Skipped(SkipReason::AlreadyIngested));
    assert_eq!(embedder.calls(), 1);
    assert_eq!(store.list_alerts("alice", &project_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_missing_embedding_config_skips_everything() {
    let (store, project_id) = seeded_store().await;
    let orchestrator = IngestOrchestrator::new(store.clone(), None, default_engine());

    let outcome = orchestrator.ingest_project("alice", &project_id).await.unwrap();

    assert_eq!(outcome, IngestOutcome::Skipped(SkipReason::EmbeddingsNotConfigured));
    assert!(store.list_alerts("alice", &project_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_quiet_logs_produce_no_embeddings() {
    let store = Arc::new(MemoryStore::new());
    let project = store.create_project("bob", "quiet").await.unwrap();
    store
        .add_file_logs(
            "bob",
            &project.id,
            "quiet.log",
            parse_log_text("2024-03-01 10:00 INFO all good\n2024-03-01 10:01 DEBUG tick"),
        )
        .await
        .unwrap();
    let embedder = Arc::new(FakeEmbedder::new());
    let orchestrator =
        IngestOrchestrator::new(store.clone(), as_provider(&embedder), default_engine());

    let outcome = orchestrator.ingest_project("bob", &project.id).await.unwrap();

    assert_eq!(outcome, IngestOutcome::NoAlerts);
    assert_eq!(embedder.calls(), 0);
    assert_eq!(store.count_embeddings("bob", &project.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_provider_failure_propagates_without_partial_state() {
    let (store, project_id) = seeded_store().await;
    let embedder = Arc::new(FakeEmbedder {
        fail: true,
        ..FakeEmbedder::new()
    });
    let orchestrator =
        IngestOrchestrator::new(store.clone(), as_provider(&embedder), default_engine());

    let result = orchestrator.ingest_project("alice", &project_id).await;

    assert!(matches!(
        result,
        Err(IngestError::Embedding(EmbeddingError::ApiError { status: 503, .. }))
    ));
    assert!(store.list_alerts("alice", &project_id).await.unwrap().is_empty());
    assert_eq!(store.count_embeddings("alice", &project_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_other_users_projects_are_untouched() {
    let (store, project_id) = seeded_store().await;
    let embedder = Arc::new(FakeEmbedder::new());
    let orchestrator =
        IngestOrchestrator::new(store.clone(), as_provider(&embedder), default_engine());

    // same project id, different owner: nothing to read
    let outcome = orchestrator.ingest_project("mallory", &project_id).await.unwrap();

    assert_eq!(outcome, IngestOutcome::NoAlerts);
    assert!(store.list_alerts("mallory", &project_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_retriever_ranks_ingested_alerts() {
    let (store, project_id) = seeded_store().await;
    let embedder = Arc::new(FakeEmbedder::new());
    let orchestrator =
        IngestOrchestrator::new(store.clone(), as_provider(&embedder), default_engine());
    orchestrator.ingest_project("alice", &project_id).await.unwrap();

    let retriever = AlertRetriever::new(store.clone(), embedder);
    let results = retriever
        .search("alice", &project_id, "why did payments fail?", 2)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].score >= results[1].score);

    let nothing = retriever.search("bob", &project_id, "anything", 5).await.unwrap();
    assert!(nothing.is_empty());
}
