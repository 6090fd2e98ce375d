// Embedding providers
// Trait for text -> vector backends plus the hosted inference API client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{EmbeddingBackend, EmbeddingConfig};

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Embedding API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Embedding model error: {0}")]
    Model(String),
}

/// Text embedding backend.
///
/// Output vectors have the same length and order as the input texts.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        match vectors.pop() {
            Some(vector) if vectors.is_empty() => Ok(vector),
            _ => Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: vectors.len() + 1,
            }),
        }
    }

    fn model(&self) -> &str;

    fn provider(&self) -> &str;
}

/// Build the configured provider; `Ok(None)` when embeddings are not configured
pub fn provider_from_config(
    config: &EmbeddingConfig,
) -> Result<Option<Arc<dyn EmbeddingProvider>>, EmbeddingError> {
    let Some(model) = &config.model else {
        return Ok(None);
    };

    match config.backend {
        EmbeddingBackend::Hosted => Ok(HfEmbeddingClient::from_config(config)
            .map(|client| Arc::new(client) as Arc<dyn EmbeddingProvider>)),
        #[cfg(feature = "local-embeddings")]
        EmbeddingBackend::Local => {
            let provider: Arc<dyn EmbeddingProvider> = Arc::new(FastEmbedProvider::new(model)?);
            Ok(Some(provider))
        }
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingBackend::Local => {
            warn!(
                model = %model,
                "Local embeddings requested but the local-embeddings feature is off"
            );
            Ok(None)
        }
    }
}

// HOSTED INFERENCE API

#[derive(Debug, Clone)]
pub struct HfEmbeddingClient {
    client: Client,
    api_token: Option<String>,
    model: String,
    base_url: String,
    batch_size: usize,
    batch_delay: Duration,
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
}

impl HfEmbeddingClient {
    pub fn new(model: impl Into<String>, api_token: Option<String>) -> Self {
        let defaults = EmbeddingConfig::default();
        Self {
            client: Client::new(),
            api_token,
            model: model.into(),
            base_url: defaults.base_url,
            batch_size: defaults.batch_size,
            batch_delay: defaults.batch_delay,
        }
    }

    /// Build from config; `None` when no model is configured
    pub fn from_config(config: &EmbeddingConfig) -> Option<Self> {
        let model = config.model.as_ref()?;
        Some(
            Self::new(model.clone(), config.api_token.clone())
                .with_base_url(config.base_url.clone())
                .with_batching(config.batch_size, config.batch_delay),
        )
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_batching(mut self, batch_size: usize, batch_delay: Duration) -> Self {
        self.batch_size = batch_size.max(1);
        self.batch_delay = batch_delay;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/pipeline/feature-extraction",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut request = self
            .client
            .post(self.endpoint())
            .json(&FeatureExtractionRequest { inputs: batch });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiError { status, body });
        }

        let vectors: Vec<Vec<f32>> = response.json().await?;
        if vectors.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for HfEmbeddingClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        info!(total = texts.len(), model = %self.model, "Total chunks to embed");

        for (batch_num, batch) in texts.chunks(self.batch_size).enumerate() {
            let vectors = self.embed_batch(batch).await?;
            embeddings.extend(vectors);
            info!("batch {} done --> {} chunks", batch_num + 1, embeddings.len());
            tokio::time::sleep(self.batch_delay).await;
        }

        Ok(embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &str {
        "huggingface"
    }
}

// LOCAL MODEL

#[cfg(feature = "local-embeddings")]
pub use local::FastEmbedProvider;

#[cfg(feature = "local-embeddings")]
mod local {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use tracing::info;

    use super::{EmbeddingError, EmbeddingProvider};

    /// Runs a fastembed model in process (downloaded on first use)
    pub struct FastEmbedProvider {
        model: Mutex<TextEmbedding>,
        model_name: String,
    }

    impl FastEmbedProvider {
        pub fn new(model_name: &str) -> Result<Self, EmbeddingError> {
            let embedding_model = match model_name {
                "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
                    EmbeddingModel::AllMiniLML6V2
                }
                "bge-small-en-v1.5" | "BAAI/bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
                "bge-base-en-v1.5" | "BAAI/bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
                other => {
                    return Err(EmbeddingError::Model(format!(
                        "Unsupported local model: {}",
                        other
                    )))
                }
            };

            info!(model = model_name, "Loading local embedding model...");
            let model = TextEmbedding::try_new(InitOptions::new(embedding_model))
                .map_err(|e| EmbeddingError::Model(e.to_string()))?;
            info!("Model loaded!");

            Ok(Self {
                model: Mutex::new(model),
                model_name: model_name.to_string(),
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FastEmbedProvider {
        async fn embed_documents(
            &self,
            texts: &[String],
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            let mut model = self
                .model
                .lock()
                .map_err(|_| EmbeddingError::Model("embedding model lock poisoned".to_string()))?;
            let vectors = model
                .embed(texts.to_vec(), None)
                .map_err(|e| EmbeddingError::Model(e.to_string()))?;

            if vectors.len() != texts.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: texts.len(),
                    actual: vectors.len(),
                });
            }
            Ok(vectors)
        }

        fn model(&self) -> &str {
            &self.model_name
        }

        fn provider(&self) -> &str {
            "fastembed"
        }
    }
}
