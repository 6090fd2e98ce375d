// Project chat
// Answers questions about a project's alerts, with the closest alert summaries as context

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::ChatConfig;
use crate::error::IngestError;
use crate::retrieval::{AlertRetriever, ScoredAlert};

/// Alert summaries handed to the model per question
pub const CHAT_CONTEXT_LIMIT: usize = 3;

const SYSTEM_INSTRUCTION: &str = "You are an AI assistant helping a user analyze their \
application anomalies. Use the provided context containing relevant parsed system ALERTS to \
answer the user's question. Provide your answer in Markdown format. Be concise and precise.";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("messages array is empty")]
    EmptyMessages,

    #[error("No user message found in the chat history")]
    NoUserMessage,

    #[error("User message content is empty")]
    EmptyQuery,

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Chat API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Chat API returned no choices")]
    EmptyResponse,
}

impl ChatError {
    /// True when the caller sent an unusable conversation
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::EmptyMessages | Self::NoUserMessage | Self::EmptyQuery)
    }
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Text generation backend
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;

    fn model(&self) -> &str;

    fn provider(&self) -> &str;
}

/// Build the configured chat client; `None` when no chat model is configured
pub fn chat_client_from_config(config: &ChatConfig) -> Option<Arc<dyn ChatClient>> {
    HfChatClient::from_config(config).map(|client| Arc::new(client) as Arc<dyn ChatClient>)
}

/// Trimmed content of the last user turn
pub fn last_user_query(messages: &[ChatMessage]) -> Result<&str, ChatError> {
    if messages.is_empty() {
        return Err(ChatError::EmptyMessages);
    }

    let last_user = messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .ok_or(ChatError::NoUserMessage)?;

    match last_user.content.trim() {
        "" => Err(ChatError::EmptyQuery),
        query => Ok(query),
    }
}

/// Single prompt: instruction, retrieved alerts, earlier turns, then the question
pub fn build_prompt(query: &str, context: &[ScoredAlert], history: &[ChatMessage]) -> String {
    let mut parts = vec![format!("System: {SYSTEM_INSTRUCTION}\n")];

    let context_block = context
        .iter()
        .map(|scored| scored.document.text.as_str())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if !context_block.is_empty() {
        parts.push(format!("Context (Retrieved Logs):\n{context_block}\n"));
    }

    parts.push("Conversation history:".to_string());
    for message in history {
        parts.push(format!("{}: {}", display_role(&message.role), message.content));
    }

    parts.push(format!("User Question: {query}"));
    parts.push("Assistant:".to_string());
    parts.join("\n")
}

fn display_role(role: &str) -> String {
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "User".to_string(),
    }
}

/// Generated answer plus the alert summaries it was grounded on
#[derive(Debug, Clone)]
pub struct ChatAnswer {
    pub response: String,
    pub context: Vec<ScoredAlert>,
}

/// Retrieval-augmented chat over one user's projects
pub struct ProjectChat {
    retriever: AlertRetriever,
    client: Arc<dyn ChatClient>,
}

impl ProjectChat {
    pub fn new(retriever: AlertRetriever, client: Arc<dyn ChatClient>) -> Self {
        Self { retriever, client }
    }

    pub async fn answer(
        &self,
        user_id: &str,
        project_id: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatAnswer, IngestError> {
        let query = last_user_query(messages)?;

        let context: Vec<ScoredAlert> = self
            .retriever
            .search(user_id, project_id, query, CHAT_CONTEXT_LIMIT)
            .await?
            .into_iter()
            .filter(|scored| !scored.document.text.is_empty())
            .collect();

        let history = &messages[..messages.len() - 1];
        let prompt = build_prompt(query, &context, history);
        info!(
            project_id = %project_id,
            matches = context.len(),
            prompt_chars = prompt.len(),
            model = %self.client.model(),
            "Chat request"
        );

        let response = self.client.generate(&prompt).await?;
        Ok(ChatAnswer { response, context })
    }
}

// HOSTED CHAT COMPLETIONS API

#[derive(Debug, Clone)]
pub struct HfChatClient {
    client: Client,
    api_token: Option<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl HfChatClient {
    pub fn new(model: impl Into<String>, api_token: Option<String>) -> Self {
        let defaults = ChatConfig::default();
        Self {
            client: Client::new(),
            api_token,
            model: model.into(),
            base_url: defaults.base_url,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            top_p: defaults.top_p,
        }
    }

    /// Build from config; `None` when no model is configured
    pub fn from_config(config: &ChatConfig) -> Option<Self> {
        let model = config.model.as_ref()?;
        let mut client = Self::new(model.clone(), config.api_token.clone())
            .with_base_url(config.base_url.clone());
        client.max_tokens = config.max_tokens;
        client.temperature = config.temperature;
        client.top_p = config.top_p;
        Some(client)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatClient for HfChatClient {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::ApiError { status, body });
        }

        let result: CompletionResponse = response.json().await?;
        result
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or(ChatError::EmptyResponse)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &str {
        "huggingface"
    }
}
