//! Relevance rating by a chat model.
//!
//! One non-streaming `/v1/chat/completions` call per candidate. The model
//! is asked for a single number between 0 and 1; the first number in its
//! reply is taken as the score.

use async_trait::async_trait;
use lexbg_search::{ScoringError, SemanticScorer};
use serde::Deserialize;
use serde_json::json;

use super::{document, endpoint, map_http_error, transport_error};
use crate::config::SemanticConfig;

const NAME: &str = "openai-chat";

const INSTRUCTION: &str = "Rate how relevant the document is to the legal question. \
Answer with a single number between 0 and 1 and nothing else.";

/// Chat-model relevance scorer.
pub struct ChatRelevanceScorer {
    client: reqwest::Client,
    config: SemanticConfig,
}

impl std::fmt::Debug for ChatRelevanceScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRelevanceScorer")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

impl ChatRelevanceScorer {
    /// Create a scorer over a shared HTTP client.
    pub fn new(client: reqwest::Client, config: SemanticConfig) -> Self {
        Self { client, config }
    }

    /// JSON body of one rating request.
    pub fn build_request(&self, query: &str, title: &str, snippet: &str) -> serde_json::Value {
        let doc = document(title, snippet, self.config.max_document_chars);
        json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": INSTRUCTION},
                {"role": "user", "content": format!("Question: {query}\n\nDocument:\n{doc}")}
            ],
            "temperature": 0,
            "max_tokens": 8,
            "stream": false,
        })
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// First decimal number in `reply`, accepted only inside `[0, 1]`.
pub fn parse_rating(reply: &str) -> Option<f64> {
    let start = reply.find(|c: char| c.is_ascii_digit())?;
    let number: String = reply[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let value: f64 = number.trim_end_matches('.').parse().ok()?;
    (0.0..=1.0).contains(&value).then_some(value)
}

#[async_trait]
impl SemanticScorer for ChatRelevanceScorer {
    async fn score(&self, query: &str, title: &str, snippet: &str) -> Result<f64, ScoringError> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let body = self.build_request(query, title, snippet);

        let response = self
            .client
            .post(endpoint(&self.config.base_url, "chat/completions"))
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

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| ScoringError::Unavailable(format!("{NAME}: invalid response: {e}")))?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        parse_rating(&reply).ok_or_else(|| {
            tracing::debug!(reply = %reply, "unparsable relevance rating");
            ScoringError::Unavailable(format!("{NAME}: reply is not a rating between 0 and 1"))
        })
    }

    fn name(&self) -> &str {
        NAME
    }
}
