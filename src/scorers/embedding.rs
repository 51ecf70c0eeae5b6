//! Relevance as embedding similarity.
//!
//! One `/v1/embeddings` call per candidate embeds the query and the
//! document together; the score is their cosine similarity, negative
//! values floored at zero.

use async_trait::async_trait;
use lexbg_search::{ScoringError, SemanticScorer};
use serde::Deserialize;
use serde_json::json;

use super::{document, endpoint, map_http_error, transport_error};
use crate::config::SemanticConfig;

const NAME: &str = "openai-embedding";

/// Embedding-similarity scorer.
pub struct EmbeddingScorer {
    client: reqwest::Client,
    config: SemanticConfig,
}

impl std::fmt::Debug for EmbeddingScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingScorer")
            .field("model", &self.config.embedding_model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

impl EmbeddingScorer {
    /// Create a scorer over a shared HTTP client.
    pub fn new(client: reqwest::Client, config: SemanticConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f64>,
}

/// Cosine similarity, `None` for mismatched or zero vectors.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm = norm_a * norm_b;
    (norm > 0.0).then(|| dot / norm)
}

#[async_trait]
impl SemanticScorer for EmbeddingScorer {
    async fn score(&self, query: &str, title: &str, snippet: &str) -> Result<f64, ScoringError> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let body = json!({
            "model": self.config.embedding_model,
            "input": [query, document(title, snippet, self.config.max_document_chars)],
        });

        let response = self
            .client
            .post(endpoint(&self.config.base_url, "embeddings"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(NAME, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| transport_error(NAME, e))?;
        if !status.is_success() {
            return Err(map_http_error(NAME, status, &text));
        }

        let mut parsed: EmbeddingResponse = serde_json::from_str(&text)
            .map_err(|e| ScoringError::Unavailable(format!("{NAME}: invalid response: {e}")))?;
        parsed.data.sort_by_key(|item| item.index);
        let [query_vec, doc_vec] = parsed.data.as_slice() else {
            return Err(ScoringError::Unavailable(format!(
                "{NAME}: expected 2 embeddings, got {}",
                parsed.data.len()
            )));
        };

        cosine_similarity(&query_vec.embedding, &doc_vec.embedding)
            .map(|s| s.max(0.0))
            .ok_or_else(|| ScoringError::Unavailable(format!("{NAME}: degenerate embeddings")))
    }

    fn name(&self) -> &str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_basics() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), Some(1.0));
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), Some(0.0));
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), Some(-1.0));
    }

    #[test]
    fn cosine_rejects_degenerate_input() {
        assert_eq!(cosine_similarity(&[], &[]), None);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), None);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), None);
    }
}
