// Ingestion configuration
// Built explicitly (or from the environment) and passed into the orchestrator.

use logsift_rules::{load_rules, RuleConfigError, RuleSet};
use std::time::Duration;

pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";
pub const DEFAULT_CHAT_MODEL: &str = "google/gemma-3-27b-it:featherless-ai";
// OpenAI-compatible chat completions router
pub const DEFAULT_CHAT_URL: &str = "https://router.huggingface.co/v1";

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingBackend {
    #[default]
    Hosted,
    Local,
}

impl EmbeddingBackend {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hosted" | "huggingface" | "hf" => Some(Self::Hosted),
            "local" | "fastembed" => Some(Self::Local),
            _ => None,
        }
    }
}

// Embedding provider configuration
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// `None` means embeddings are not configured and ingestion is skipped
    pub model: Option<String>,
    pub api_token: Option<String>,
    pub base_url: String,
    pub batch_size: usize,
    /// pause after every batch to respect provider rate limits
    pub batch_delay: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Hosted,
            model: Some(DEFAULT_EMBEDDING_MODEL.to_string()),
            api_token: None,
            base_url: DEFAULT_INFERENCE_URL.to_string(),
            batch_size: 32,
            batch_delay: Duration::from_millis(500),
        }
    }
}

impl EmbeddingConfig {
    /// Read from the environment
    /// - EMBEDDING_BACKEND: "hosted" (default) or "local"
    /// - HF_EMBEDDING_MODEL: model id (empty string disables embeddings)
    /// - HF_TOKEN: bearer token
    /// - HF_INFERENCE_URL: base url of the feature-extraction API
    /// - EMBEDDING_BATCH_SIZE / EMBEDDING_BATCH_DELAY_MS
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let model = match std::env::var("HF_EMBEDDING_MODEL") {
            Ok(model) if model.trim().is_empty() => None,
            Ok(model) => Some(model),
            Err(_) => defaults.model,
        };

        Self {
            backend: std::env::var("EMBEDDING_BACKEND")
                .ok()
                .and_then(|b| EmbeddingBackend::from_name(&b))
                .unwrap_or_default(),
            model,
            api_token: std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty()),
            base_url: std::env::var("HF_INFERENCE_URL").unwrap_or(defaults.base_url),
            batch_size: env_parse("EMBEDDING_BATCH_SIZE")
                .filter(|size| *size > 0)
                .unwrap_or(defaults.batch_size),
            batch_delay: env_parse("EMBEDDING_BATCH_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.batch_delay),
        }
    }
}

// Chat model configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// `None` disables the chat endpoint
    pub model: Option<String>,
    pub api_token: Option<String>,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: Some(DEFAULT_CHAT_MODEL.to_string()),
            api_token: None,
            base_url: DEFAULT_CHAT_URL.to_string(),
            max_tokens: 1024,
            temperature: 0.3,
            top_p: 0.9,
        }
    }
}

impl ChatConfig {
    /// Read from the environment
    /// - HF_CHAT_MODEL: model id (empty string disables chat)
    /// - HF_TOKEN: bearer token, shared with embeddings
    /// - HF_CHAT_URL: base url of the chat completions API
    /// - CHAT_MAX_TOKENS
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let model = match std::env::var("HF_CHAT_MODEL") {
            Ok(model) if model.trim().is_empty() => None,
            Ok(model) => Some(model),
            Err(_) => defaults.model,
        };

        Self {
            model,
            api_token: std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty()),
            base_url: std::env::var("HF_CHAT_URL").unwrap_or(defaults.base_url),
            max_tokens: env_parse("CHAT_MAX_TOKENS")
                .filter(|tokens| *tokens > 0)
                .unwrap_or(defaults.max_tokens),
            temperature: defaults.temperature,
            top_p: defaults.top_p,
        }
    }
}

// Full ingestion configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub embedding: EmbeddingConfig,
    pub chat: ChatConfig,
    pub rules: RuleSet,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            chat: ChatConfig::default(),
            rules: RuleSet::ingest_defaults(),
        }
    }
}

impl IngestConfig {
    /// Load `.env`, then read embedding settings and the optional
    /// LOGSIFT_RULES_FILE (TOML rule set replacing the defaults)
    pub fn from_env() -> Result<Self, RuleConfigError> {
        dotenvy::dotenv().ok();

        let rules = match std::env::var("LOGSIFT_RULES_FILE") {
            Ok(path) if !path.is_empty() => load_rules(path)?,
            _ => RuleSet::ingest_defaults(),
        };

        Ok(Self {
            embedding: EmbeddingConfig::from_env(),
            chat: ChatConfig::from_env(),
            rules,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.embedding.model.as_deref(), Some(DEFAULT_EMBEDDING_MODEL));
        assert_eq!(config.embedding.batch_size, 32);
        assert_eq!(config.embedding.batch_delay, Duration::from_millis(500));
        assert_eq!(config.rules.rules.len(), 4);
        assert_eq!(config.embedding.backend, EmbeddingBackend::Hosted);
        assert_eq!(config.chat.model.as_deref(), Some(DEFAULT_CHAT_MODEL));
        assert_eq!(config.chat.base_url, "https://router.huggingface.co/v1");
        assert_eq!(config.chat.max_tokens, 1024);
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(EmbeddingBackend::from_name("HF"), Some(EmbeddingBackend::Hosted));
        assert_eq!(EmbeddingBackend::from_name("fastembed"), Some(EmbeddingBackend::Local));
        assert_eq!(EmbeddingBackend::from_name("openai"), None);
    }
}
