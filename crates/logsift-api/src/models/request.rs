use logsift_ingest::ChatMessage;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    5
}

#[derive(Deserialize)]
pub struct ChatRequest {
    /// Oldest turn first; the last `user` turn is the question
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}
