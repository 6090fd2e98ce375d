// Server configuration, read once at startup

use logsift_ingest::IngestConfig;
use logsift_rules::RuleConfigError;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    /// shared key checked against X-API-Key; disabled when None
    pub api_key: Option<String>,
    /// allowed CORS origin; permissive when None
    pub cors_origin: Option<String>,
    pub ingest: IngestConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, RuleConfigError> {
        let ingest = IngestConfig::from_env()?;

        Ok(Self {
            bind: std::env::var("LOGSIFT_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
            api_key: non_empty_env("LOGSIFT_API_KEY"),
            cors_origin: non_empty_env("LOGSIFT_CORS_ORIGIN"),
            ingest,
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            api_key: None,
            cors_origin: None,
            ingest: IngestConfig::default(),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
