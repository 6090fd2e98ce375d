// Alert retrieval - rank a project's alert summaries against a question

use std::cmp::Ordering;
use std::sync::Arc;

use logsift_core::EmbeddingDocument;

use crate::embedding::EmbeddingProvider;
use crate::error::IngestError;
use crate::store::ProjectStore;

#[derive(Debug, Clone)]
pub struct ScoredAlert {
    pub score: f32,
    pub document: EmbeddingDocument,
}

#[derive(Clone)]
pub struct AlertRetriever {
    store: Arc<dyn ProjectStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl AlertRetriever {
    pub fn new(store: Arc<dyn ProjectStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    /// Best matching alert summaries first, at most `limit` of them
    pub async fn search(
        &self,
        user_id: &str,
        project_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredAlert>, IngestError> {
        let documents = self.store.list_embeddings(user_id, project_id).await?;
        if documents.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(query).await?;
        Ok(rank(&query_vector, documents, limit))
    }
}

fn rank(query: &[f32], documents: Vec<EmbeddingDocument>, limit: usize) -> Vec<ScoredAlert> {
    let mut scored: Vec<ScoredAlert> = documents
        .into_iter()
        .map(|document| ScoredAlert {
            score: cosine_similarity(query, &document.embedding),
            document,
        })
        .collect();

    // sort by score descending
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(limit);
    scored
}

/// Cosine similarity; 0.0 for empty, zero or mismatched vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
