//! OpenAI-compatible semantic scorers.
//!
//! Both scorers talk to any server that speaks the OpenAI HTTP API
//! (OpenAI itself, a local llama.cpp or vLLM server). Every failure maps
//! to [`ScoringError::Unavailable`]; the search core then scores the
//! candidate zero and carries on.

pub mod chat;
pub mod embedding;

pub use chat::ChatRelevanceScorer;
pub use embedding::EmbeddingScorer;

use std::sync::Arc;

use lexbg_search::{ScoringError, SemanticScorer};

use crate::config::{SemanticConfig, SemanticMode};
use crate::error::{AppError, Result};

/// Build the configured scorer, or `None` when semantic scoring is
/// disabled or has no API key.
///
/// # Errors
///
/// Returns [`AppError::Scorer`] if the HTTP client cannot be built.
pub fn build_scorer(config: &SemanticConfig) -> Result<Option<Arc<dyn SemanticScorer>>> {
    if !config.is_usable() {
        tracing::info!(
            enabled = config.enabled,
            "semantic scorer not configured; ranking will be lexical"
        );
        return Ok(None);
    }
    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| AppError::Scorer(format!("failed to build HTTP client: {e}")))?;

    let scorer: Arc<dyn SemanticScorer> = match config.mode {
        SemanticMode::Chat => Arc::new(ChatRelevanceScorer::new(client, config.clone())),
        SemanticMode::Embedding => Arc::new(EmbeddingScorer::new(client, config.clone())),
    };
    tracing::info!(scorer = scorer.name(), "semantic scorer ready");
    Ok(Some(scorer))
}

/// `{base}/v1/{endpoint}` with any trailing slash on the base removed.
pub(crate) fn endpoint(base_url: &str, endpoint: &str) -> String {
    format!("{}/v1/{endpoint}", base_url.trim_end_matches('/'))
}

/// The candidate text sent upstream, cut to `max_chars` characters.
pub(crate) fn document(title: &str, snippet: &str, max_chars: usize) -> String {
    let text = format!("{title}\n{snippet}");
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_owned(),
        None => text,
    }
}

/// Map a non-success HTTP status to a scoring error.
pub(crate) fn map_http_error(scorer: &str, status: reqwest::StatusCode, body: &str) -> ScoringError {
    let message = extract_error_message(body);
    match status.as_u16() {
        401 | 403 => ScoringError::Unavailable(format!("{scorer}: authentication failed: {message}")),
        429 => ScoringError::Unavailable(format!("{scorer}: rate limited: {message}")),
        code => ScoringError::Unavailable(format!("{scorer}: HTTP {code}: {message}")),
    }
}

/// Transport failure, with the URL stripped.
pub(crate) fn transport_error(scorer: &str, err: reqwest::Error) -> ScoringError {
    if err.is_timeout() {
        ScoringError::Timeout(format!("{scorer}: request timed out"))
    } else {
        ScoringError::Unavailable(format!("{scorer}: request failed: {}", err.without_url()))
    }
}

/// Extract an error message from an OpenAI error response body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_cleanly() {
        assert_eq!(
            endpoint("https://api.openai.com/", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn document_cuts_on_char_boundary() {
        assert_eq!(document("Закон", "за задълженията", 8), "Закон\nза");
        assert_eq!(document("а", "б", 100), "а\nб");
    }

    #[test]
    fn error_message_from_json_body() {
        let err = map_http_error(
            "chat",
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error": {"message": "Incorrect API key provided"}}"#,
        );
        assert_eq!(err.code(), "SEMANTIC_UNAVAILABLE");
        assert!(err.to_string().contains("Incorrect API key"));
    }

    #[test]
    fn rate_limit_is_unavailable() {
        let err = map_http_error("chat", reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn unusable_config_builds_nothing() {
        let scorer = build_scorer(&SemanticConfig::default()).expect("no error");
        assert!(scorer.is_none());
    }

    #[test]
    fn mode_selects_scorer() {
        let config = SemanticConfig {
            api_key: Some("sk-test".into()),
            mode: SemanticMode::Embedding,
            ..Default::default()
        };
        let scorer = build_scorer(&config).expect("build").expect("scorer");
        assert_eq!(scorer.name(), "openai-embedding");
    }
}
