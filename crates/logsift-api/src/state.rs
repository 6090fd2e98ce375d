use std::sync::Arc;

use logsift_core::parser::LogLineParser;
use logsift_ingest::{AlertRetriever, ChatClient, IngestOrchestrator, ProjectChat, ProjectStore};

pub struct AppState {
    pub store: Arc<dyn ProjectStore>,
    pub parser: LogLineParser,
    pub orchestrator: Arc<IngestOrchestrator>,
    /// None when no embedding provider is configured
    pub retriever: Option<AlertRetriever>,
    /// None unless both embeddings and a chat model are configured
    pub chat: Option<ProjectChat>,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        orchestrator: Arc<IngestOrchestrator>,
        chat_client: Option<Arc<dyn ChatClient>>,
        api_key: Option<String>,
    ) -> Self {
        let retriever = orchestrator
            .embedder()
            .map(|embedder| AlertRetriever::new(store.clone(), embedder));
        let chat = retriever
            .clone()
            .zip(chat_client)
            .map(|(retriever, client)| ProjectChat::new(retriever, client));

        Self {
            store,
            parser: LogLineParser::new(),
            orchestrator,
            retriever,
            chat,
            api_key,
        }
    }
}
