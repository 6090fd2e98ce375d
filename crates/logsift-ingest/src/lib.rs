// logsift ingestion - turns uploaded project logs into stored alerts and searchable summaries

pub mod chat;
pub mod config;
pub mod embedding;
pub mod error;
pub mod orchestrator;
pub mod retrieval;
pub mod store;

pub use chat::{
    build_prompt, chat_client_from_config, last_user_query, ChatAnswer, ChatClient, ChatError,
    ChatMessage, HfChatClient, ProjectChat, CHAT_CONTEXT_LIMIT,
};
pub use config::{ChatConfig, EmbeddingBackend, EmbeddingConfig, IngestConfig};
pub use embedding::{provider_from_config, EmbeddingError, EmbeddingProvider, HfEmbeddingClient};
#[cfg(feature = "local-embeddings")]
pub use embedding::FastEmbedProvider;
pub use error::IngestError;
pub use orchestrator::{render_summary, IngestOrchestrator, IngestOutcome, SkipReason};
pub use retrieval::{cosine_similarity, AlertRetriever, ScoredAlert};
pub use store::{MemoryStore, Project, ProjectLogFile, ProjectStore, StoreError};
