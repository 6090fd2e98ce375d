// Ingestion errors

use logsift_rules::RuleConfigError;
use thiserror::Error;

use crate::chat::ChatError;
use crate::embedding::EmbeddingError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Embedding provider error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Rule configuration error: {0}")]
    Rules(#[from] RuleConfigError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),
}
