//! Provider contract tests.
//!
//! Verify the HTTP request shape each adapter sends and how upstream
//! statuses and bodies map onto `ProviderError` kinds, against a local
//! mock server. No live network access.

use lexbg_search::config::{DuckDuckGoConfig, GoogleCseConfig, TavilyConfig};
use lexbg_search::providers::{DuckDuckGoProvider, GoogleCseProvider, TavilyProvider};
use lexbg_search::{
    DomainConfig, DomainRegistry, EngineConfig, LegalSearch, Methodology, ProviderKind,
    SearchProvider, SearchRequest,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn domain(key: &str) -> DomainConfig {
    DomainRegistry::builtin()
        .get(key)
        .cloned()
        .unwrap_or_else(|| panic!("builtin domain {key}"))
}

fn google(server: &MockServer) -> GoogleCseProvider {
    GoogleCseProvider::new(
        reqwest::Client::new(),
        GoogleCseConfig {
            api_key: Some("test-key".into()),
            engine_id: Some("cx-1".into()),
            base_url: server.uri(),
            ..Default::default()
        },
    )
}

fn tavily(server: &MockServer) -> TavilyProvider {
    TavilyProvider::new(
        reqwest::Client::new(),
        TavilyConfig {
            api_key: Some("tvly-test".into()),
            base_url: server.uri(),
            ..Default::default()
        },
    )
}

fn duckduckgo(server: &MockServer) -> DuckDuckGoProvider {
    DuckDuckGoProvider::new(
        reqwest::Client::new(),
        DuckDuckGoConfig {
            base_url: server.uri(),
            ..Default::default()
        },
    )
}

const DDG_PAGE: &str = r#"<html><body>
<div class="result results_links results_links_deep web-result">
  <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Flex.bg%2Flaws%2Fldoc%2F2121934337&rut=x">Закон за задълженията и договорите</a>
  <a class="result__snippet">Чл. 45. Всеки е длъжен да поправи вредите, които виновно е причинил другиму.</a>
</div>
<div class="result results_links results_links_deep web-result">
  <a class="result__a" href="https://lex.bg/news/view/12345">Обезщетение за неимуществени вреди</a>
  <a class="result__snippet">Съдебна практика по чл. 52 ЗЗД.</a>
</div>
</body></html>"#;

// ── Google Custom Search ─────────────────────────────────────────────────

#[tokio::test]
async fn google_sends_site_restricted_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", "test-key"))
        .and(query_param("cx", "cx-1"))
        .and(query_param("q", "обезщетение"))
        .and(query_param("num", "5"))
        .and(query_param("gl", "bg"))
        .and(query_param("lr", "lang_bg"))
        .and(query_param("siteSearch", "lex.bg"))
        .and(query_param("siteSearchFilter", "i"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"title": "Обезщетение", "link": "https://lex.bg/a", "snippet": "чл. 52 ЗЗД"},
                {"title": "Без връзка"},
                {"link": "https://lex.bg/b"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = google(&server)
        .search("обезщетение", Some(&domain("lex_bg")), 5)
        .await
        .expect("results");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].url, "https://lex.bg/a");
    assert_eq!(results[1].title, "");
    assert!(results.iter().all(|r| r.provider == ProviderKind::GoogleCse));
}

#[tokio::test]
async fn google_clamps_num_to_ten() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("num", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"title": "t", "link": "https://vks.bg/1", "snippet": "s"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = google(&server)
        .search("давност", Some(&domain("vks_bg")), 50)
        .await
        .expect("results");
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn google_429_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = google(&server).search("q", None, 5).await.unwrap_err();
    assert_eq!(err.code(), "RATE_LIMITED");
}

#[tokio::test]
async fn google_403_quota_reason_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "errors": [{"reason": "dailyLimitExceeded"}]}
        })))
        .mount(&server)
        .await;

    let err = google(&server).search("q", None, 5).await.unwrap_err();
    assert_eq!(err.code(), "RATE_LIMITED");
}

#[tokio::test]
async fn google_403_bad_key_is_auth_failed_without_leaking_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "errors": [{"reason": "forbidden"}]}
        })))
        .mount(&server)
        .await;

    let err = google(&server).search("q", None, 5).await.unwrap_err();
    assert_eq!(err.code(), "AUTH_FAILED");
    assert!(!err.to_string().contains("test-key"));
}

#[tokio::test]
async fn google_5xx_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = google(&server).search("q", None, 5).await.unwrap_err();
    assert_eq!(err.code(), "NETWORK_ERROR");
}

#[tokio::test]
async fn google_without_items_is_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "customsearch#search"})))
        .mount(&server)
        .await;

    let err = google(&server).search("q", None, 5).await.unwrap_err();
    assert_eq!(err.code(), "NO_RESULTS");
}

// ── Tavily ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn tavily_posts_json_with_include_domains() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({
            "api_key": "tvly-test",
            "query": "давност решение",
            "max_results": 3,
            "include_domains": ["vks.bg"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"title": "Тълкувателно решение", "url": "https://vks.bg/tr/1", "content": "погасителна давност"},
                {"title": "Без адрес", "content": "x"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = tavily(&server)
        .search("давност", Some(&domain("vks_bg")), 3)
        .await
        .expect("results");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].snippet, "погасителна давност");
    assert_eq!(results[0].source_domain, "vks.bg");
}

#[tokio::test]
async fn tavily_status_mapping() {
    for (status, code) in [
        (401, "AUTH_FAILED"),
        (403, "AUTH_FAILED"),
        (429, "RATE_LIMITED"),
        (432, "RATE_LIMITED"),
        (433, "RATE_LIMITED"),
        (500, "NETWORK_ERROR"),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        let err = tavily(&server).search("q", None, 5).await.unwrap_err();
        assert_eq!(err.code(), code, "HTTP {status}");
    }
}

#[tokio::test]
async fn tavily_empty_results_is_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let err = tavily(&server).search("q", None, 5).await.unwrap_err();
    assert_eq!(err.code(), "NO_RESULTS");
}

// ── DuckDuckGo ───────────────────────────────────────────────────────────

#[tokio::test]
async fn duckduckgo_posts_site_query_and_unwraps_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/html/"))
        .and(body_string_contains("site%3Alex.bg"))
        .and(body_string_contains("kl=bg-bg"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DDG_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let results = duckduckgo(&server)
        .search("вреди", Some(&domain("lex_bg")), 10)
        .await
        .expect("results");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].url, "https://lex.bg/laws/ldoc/2121934337");
    assert!(results[0].snippet.starts_with("Чл. 45."));
}

#[tokio::test]
async fn duckduckgo_throttling_statuses_are_rate_limited() {
    for status in [202, 403, 429] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        let err = duckduckgo(&server).search("q", None, 5).await.unwrap_err();
        assert_eq!(err.code(), "RATE_LIMITED", "HTTP {status}");
    }
}

#[tokio::test]
async fn duckduckgo_anomaly_page_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div class="anomaly-modal">Unfortunately, bots use DuckDuckGo too.</div></body></html>"#,
        ))
        .mount(&server)
        .await;

    let err = duckduckgo(&server).search("q", None, 5).await.unwrap_err();
    assert_eq!(err.code(), "RATE_LIMITED");
}

#[tokio::test]
async fn duckduckgo_empty_page_is_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;

    let err = duckduckgo(&server).search("q", None, 5).await.unwrap_err();
    assert_eq!(err.code(), "NO_RESULTS");
}

// ── Full engine over real adapters ───────────────────────────────────────

#[tokio::test]
async fn engine_falls_back_from_throttled_google_to_duckduckgo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DDG_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let config = EngineConfig {
        providers: vec![ProviderKind::GoogleCse, ProviderKind::DuckDuckGo],
        google: GoogleCseConfig {
            api_key: Some("test-key".into()),
            engine_id: Some("cx-1".into()),
            base_url: server.uri(),
            ..Default::default()
        },
        duckduckgo: DuckDuckGoConfig {
            base_url: server.uri(),
            ..Default::default()
        },
        inter_query_delay_ms: 0,
        ..Default::default()
    };
    let engine = LegalSearch::new(config).expect("engine");
    let request = SearchRequest::new("вреди", vec![domain("lex_bg")])
        .with_min_relevancy(0.0)
        .with_methodology(Methodology::Standard);

    let outcome = engine.search(&request).await.expect("fallback answers");
    assert!(!outcome.results.is_empty());
    assert!(outcome
        .results
        .iter()
        .all(|r| r.result.provider == ProviderKind::DuckDuckGo && r.result.source_domain == "lex_bg"));
    assert!(!outcome.is_partial(), "{:?}", outcome.degradations);
}
