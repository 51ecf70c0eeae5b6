//! # lexbg-search
//!
//! Search core for Bulgarian legal research.
//!
//! The crate queries Bulgarian legal sources (lex.bg, ciela.net, the courts,
//! the State Gazette and others) through a chain of web search providers,
//! merges what comes back and ranks it by relevance to the legal question.
//!
//! ## Design
//!
//! - One query per legal domain, spaced out and run on a bounded pool
//! - Per domain, providers are tried in order (Google Custom Search, then
//!   Tavily, then DuckDuckGo); the first non-empty answer wins
//! - Local quotas and rate-limit back-off, injected and shared between
//!   requests, keep throttled providers from being hammered
//! - Results are deduplicated by normalised URL, scored with BM25 and an
//!   optional [`SemanticScorer`], and fused with reciprocal rank fusion
//!   with domain authority breaking ties
//! - Graceful degradation: failed domains, a failing semantic scorer or a
//!   reached deadline shrink the answer instead of failing it
//!
//! ## Security
//!
//! - API keys never appear in errors, logs or `Debug` output
//! - No network listeners; this is a library, not a server
//! - Search queries are logged only at trace level

pub mod circuit_breaker;
pub mod config;
pub mod content;
pub mod domains;
pub mod error;
pub mod http;
pub mod legal;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod rate_limit;
pub mod semantic;
pub mod types;

pub use config::EngineConfig;
pub use content::{analyze_document, extract_content, DocumentAnalysis};
pub use domains::{DomainConfig, DomainRegistry, DomainTier};
pub use error::{ProviderError, Result, ScoringError, SearchError};
pub use legal::{classify_area, extract_citations, AreaClassification, Citation, LegalArea};
pub use orchestrator::fusion::AuthorityMode;
pub use orchestrator::LegalSearch;
pub use provider::SearchProvider;
pub use providers::Provider;
pub use rate_limit::{Backoff, Clock, RateLimiter, SystemClock};
pub use semantic::SemanticScorer;
pub use types::{
    Methodology, PageContent, ProviderKind, ScoredResult, SearchOutcome, SearchRequest,
    SearchResult,
};

/// Search every built-in legal domain with the given configuration.
///
/// Domains are searched in priority order (legal databases first, news
/// last) with the default request limits and lexical scoring only. Build
/// a [`LegalSearch`] directly to reuse quotas across calls or to plug in
/// a semantic scorer.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid configuration,
/// [`SearchError::InvalidRequest`] for a blank query, or
/// [`SearchError::AllProvidersFailed`] if nothing could be retrieved.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> lexbg_search::Result<()> {
/// let config = lexbg_search::EngineConfig::default();
/// let outcome = lexbg_search::search("обезщетение за неимуществени вреди", &config).await?;
/// for result in &outcome.results {
///     println!("{}. {} ({})", result.fused_rank, result.result.title, result.result.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(query: &str, config: &EngineConfig) -> Result<SearchOutcome> {
    let engine = LegalSearch::new(config.clone())?;
    let request = SearchRequest::new(query, DomainRegistry::builtin().prioritized());
    engine.search(&request).await
}

/// Fetch a legal document and report its type, citations and summary.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the HTTP client cannot be built, or
/// [`SearchError::Document`] if the page cannot be fetched or has no
/// readable text.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> lexbg_search::Result<()> {
/// let config = lexbg_search::EngineConfig::default();
/// let doc = lexbg_search::fetch_document("https://lex.bg/laws/ldoc/2121934337", &config).await?;
/// println!("{:?}: {} citations", doc.document_type, doc.citations.len());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_document(url: &str, config: &EngineConfig) -> Result<DocumentAnalysis> {
    let client = http::build_client(config)?;
    analyze_document(&client, url).await
}
