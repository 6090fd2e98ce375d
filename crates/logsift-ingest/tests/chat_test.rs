use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use logsift_core::{EmbeddingDocument, Severity};
use logsift_ingest::{
    AlertRetriever, ChatClient, ChatError, ChatMessage, EmbeddingError, EmbeddingProvider,
    IngestError, MemoryStore, ProjectChat, ProjectStore,
};

// Embeds by keyword: [mentions "payment", mentions "cache"]
struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                vec![
                    t.contains("payment") as u8 as f32,
                    t.contains("cache") as u8 as f32,
                ]
            })
            .collect())
    }

    fn model(&self) -> &str {
        "keywords"
    }

    fn provider(&self) -> &str {
        "test"
    }
}

// Echoes a canned answer and keeps the last prompt
#[derive(Default)]
struct RecordingChat {
    prompt: Mutex<Option<String>>,
}

#[async_trait]
impl ChatClient for RecordingChat {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        *self.prompt.lock().unwrap() = Some(prompt.to_string());
        Ok("Payments are failing.".to_string())
    }

    fn model(&self) -> &str {
        "recording"
    }

    fn provider(&self) -> &str {
        "test"
    }
}

fn document(user: &str, project: &str, text: &str, embedding: Vec<f32>) -> EmbeddingDocument {
    EmbeddingDocument {
        user_id: user.to_string(),
        project_id: project.to_string(),
        alert_name: "Keyword Alert".to_string(),
        severity: Severity::Medium,
        reason: String::new(),
        text: text.to_string(),
        embedding,
    }
}

async fn chat_fixture() -> (ProjectChat, Arc<RecordingChat>, String) {
    let store = Arc::new(MemoryStore::new());
    let project = store.create_project("u1", "shop").await.unwrap();

    let mut documents: Vec<EmbeddingDocument> = (0..4)
        .map(|i| document("u1", &project.id, &format!("payment failure {i}"), vec![1.0, 0.1]))
        .collect();
    documents.push(document("u1", &project.id, "cache miss storm", vec![0.0, 1.0]));
    documents.push(document("u2", &project.id, "payment from another user", vec![1.0, 0.0]));
    store.insert_embeddings(documents).await.unwrap();

    let retriever = AlertRetriever::new(store, Arc::new(KeywordEmbedder));
    let chat = Arc::new(RecordingChat::default());
    let client: Arc<dyn ChatClient> = chat.clone();
    (ProjectChat::new(retriever, client), chat, project.id)
}

#[tokio::test]
async fn test_answer_uses_top_three_alerts() {
    let (project_chat, chat, project_id) = chat_fixture().await;

    let messages = vec![
        ChatMessage::new("user", "hello"),
        ChatMessage::new("assistant", "Hi, ask me about your alerts."),
        ChatMessage::new("user", "Why do payments fail?"),
    ];
    let answer = project_chat.answer("u1", &project_id, &messages).await.unwrap();

    assert_eq!(answer.response, "Payments are failing.");
    assert_eq!(answer.context.len(), 3);
    assert!(answer
        .context
        .iter()
        .all(|scored| scored.document.text.starts_with("payment failure")));

    let prompt = chat.prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("Context (Retrieved Logs):\npayment failure"));
    assert!(!prompt.contains("another user"));
    assert!(prompt.contains("Assistant: Hi, ask me about your alerts."));
    assert!(prompt.ends_with("User Question: Why do payments fail?\nAssistant:"));
}

#[tokio::test]
async fn test_answer_without_alerts_has_no_context() {
    let (project_chat, chat, _) = chat_fixture().await;

    let messages = vec![ChatMessage::new("user", "anything?")];
    let answer = project_chat.answer("u1", "other-project", &messages).await.unwrap();

    assert!(answer.context.is_empty());
    let prompt = chat.prompt.lock().unwrap().clone().unwrap();
    assert!(!prompt.contains("Context (Retrieved Logs)"));
}

#[tokio::test]
async fn test_invalid_conversation_never_reaches_the_model() {
    let (project_chat, chat, project_id) = chat_fixture().await;

    let messages = vec![ChatMessage::new("assistant", "only me")];
    let err = project_chat.answer("u1", &project_id, &messages).await.unwrap_err();

    assert!(matches!(err, IngestError::Chat(ChatError::NoUserMessage)));
    assert!(chat.prompt.lock().unwrap().is_none());
}
