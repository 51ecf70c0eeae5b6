//! Semantic scorer contract tests.
//!
//! Verify the HTTP requests the chat and embedding scorers send to an
//! OpenAI-compatible server, how they read the replies, and that every
//! upstream failure maps to a scoring error without leaking the API key.

use lexbg::scorers::{ChatRelevanceScorer, EmbeddingScorer};
use lexbg::{SemanticConfig, SemanticMode};
use lexbg_search::SemanticScorer;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "sk-contract-secret";

fn config(server: &MockServer, mode: SemanticMode) -> SemanticConfig {
    SemanticConfig {
        mode,
        api_key: Some(KEY.into()),
        base_url: server.uri(),
        model: "gpt-test".into(),
        embedding_model: "embed-test".into(),
        ..Default::default()
    }
}

fn chat_scorer(server: &MockServer) -> ChatRelevanceScorer {
    ChatRelevanceScorer::new(reqwest::Client::new(), config(server, SemanticMode::Chat))
}

fn embedding_scorer(server: &MockServer) -> EmbeddingScorer {
    EmbeddingScorer::new(reqwest::Client::new(), config(server, SemanticMode::Embedding))
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-test",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Chat scorer
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_request_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", format!("Bearer {KEY}").as_str()))
        .and(body_partial_json(json!({"model": "gpt-test", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("0.8")))
        .expect(1)
        .mount(&server)
        .await;

    let score = chat_scorer(&server)
        .score("обезщетение за вреди", "Закон за задълженията", "непозволено увреждане")
        .await
        .expect("score");
    assert!((score - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn test_chat_reply_with_prose_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Relevance: 0.35")))
        .mount(&server)
        .await;

    let score = chat_scorer(&server).score("давност", "t", "s").await.expect("score");
    assert!((score - 0.35).abs() < 1e-9);
}

#[tokio::test]
async fn test_chat_unparsable_reply_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("very relevant")))
        .mount(&server)
        .await;

    let err = chat_scorer(&server).score("давност", "t", "s").await.unwrap_err();
    assert_eq!(err.code(), "SEMANTIC_UNAVAILABLE");
}

#[tokio::test]
async fn test_chat_empty_choices_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = chat_scorer(&server).score("давност", "t", "s").await.unwrap_err();
    assert_eq!(err.code(), "SEMANTIC_UNAVAILABLE");
}

#[tokio::test]
async fn test_chat_http_errors_map_without_key() {
    for (status, expected) in [
        (401, "authentication failed"),
        (429, "rate limited"),
        (500, "HTTP 500"),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {"message": "upstream says no", "type": "error"}
            })))
            .mount(&server)
            .await;

        let err = chat_scorer(&server).score("давност", "t", "s").await.unwrap_err();
        let text = err.to_string();
        assert_eq!(err.code(), "SEMANTIC_UNAVAILABLE", "status {status}");
        assert!(text.contains(expected), "status {status}: {text}");
        assert!(text.contains("upstream says no"));
        assert!(!text.contains(KEY));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Embedding scorer
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_embedding_request_and_cosine() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", format!("Bearer {KEY}").as_str()))
        .and(body_partial_json(json!({"model": "embed-test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                {"object": "embedding", "index": 1, "embedding": [0.6, 0.8]},
                {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let score = embedding_scorer(&server)
        .score("давност", "Закон за задълженията", "погасителна давност")
        .await
        .expect("score");
    assert!((score - 0.6).abs() < 1e-9);
}

#[tokio::test]
async fn test_embedding_negative_similarity_floors_at_zero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"index": 0, "embedding": [1.0, 0.0]},
                {"index": 1, "embedding": [-1.0, 0.0]}
            ]
        })))
        .mount(&server)
        .await;

    let score = embedding_scorer(&server).score("q", "t", "s").await.expect("score");
    assert_eq!(score, 0.0);
}

#[tokio::test]
async fn test_embedding_wrong_count_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [1.0, 0.0]}]
        })))
        .mount(&server)
        .await;

    let err = embedding_scorer(&server).score("q", "t", "s").await.unwrap_err();
    assert!(err.to_string().contains("expected 2 embeddings"));
}

#[tokio::test]
async fn test_embedding_auth_failure_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let err = embedding_scorer(&server).score("q", "t", "s").await.unwrap_err();
    assert_eq!(err.code(), "SEMANTIC_UNAVAILABLE");
    assert!(!err.to_string().contains(KEY));
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    let server = MockServer::start().await;
    let scorer = chat_scorer(&server);
    drop(server);

    let err = scorer.score("q", "t", "s").await.unwrap_err();
    assert_eq!(err.code(), "SEMANTIC_UNAVAILABLE");
}
