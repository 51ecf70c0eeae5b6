//! Engine configuration with sensible defaults.
//!
//! [`EngineConfig`] controls which providers are tried and in what order,
//! timeouts, pacing between domain queries, candidate pool sizing and the
//! scoring parameters. The defaults are tuned for the free Google CSE tier
//! and polite scraping of the Bulgarian legal sites.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::error::SearchError;
use crate::orchestrator::fusion::AuthorityMode;
use crate::rate_limit::Quota;
use crate::types::ProviderKind;

/// Google Custom Search JSON API settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleCseConfig {
    /// API key. `None` makes every call fail with `AUTH_FAILED`.
    pub api_key: Option<String>,
    /// Programmable search engine id (`cx`).
    pub engine_id: Option<String>,
    /// API base URL, overridable for tests.
    pub base_url: String,
    /// Country bias (`gl`).
    pub country: String,
    /// Language restriction (`lr`).
    pub language: String,
}

impl Default for GoogleCseConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            base_url: "https://www.googleapis.com".into(),
            country: "bg".into(),
            language: "lang_bg".into(),
        }
    }
}

impl fmt::Debug for GoogleCseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleCseConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("engine_id", &self.engine_id)
            .field("base_url", &self.base_url)
            .field("country", &self.country)
            .field("language", &self.language)
            .finish()
    }
}

/// Tavily search API settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TavilyConfig {
    /// API key. `None` makes every call fail with `AUTH_FAILED`.
    pub api_key: Option<String>,
    /// API base URL, overridable for tests.
    pub base_url: String,
    /// `basic` or `advanced`.
    pub search_depth: String,
}

impl Default for TavilyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.tavily.com".into(),
            search_depth: "basic".into(),
        }
    }
}

impl fmt::Debug for TavilyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

/// DuckDuckGo HTML endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuckDuckGoConfig {
    /// Endpoint base URL, overridable for tests.
    pub base_url: String,
    /// Region code (`kl`).
    pub region: String,
}

impl Default for DuckDuckGoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://html.duckduckgo.com".into(),
            region: "bg-bg".into(),
        }
    }
}

/// BM25 term-saturation and length-normalisation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// Term frequency saturation.
    pub k1: f64,
    /// Length normalisation in `[0, 1]`.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Per-provider quotas. `None` means unlimited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Google CSE quota.
    pub google_cse: Option<Quota>,
    /// Tavily quota.
    pub tavily: Option<Quota>,
    /// DuckDuckGo quota.
    pub duckduckgo: Option<Quota>,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            google_cse: Some(Quota::GOOGLE_CSE_FREE),
            tavily: None,
            duckduckgo: None,
        }
    }
}

impl QuotaConfig {
    /// Quotas keyed by provider, as the rate limiter wants them.
    pub fn to_map(&self) -> HashMap<ProviderKind, Quota> {
        [
            (ProviderKind::GoogleCse, self.google_cse),
            (ProviderKind::Tavily, self.tavily),
            (ProviderKind::DuckDuckGo, self.duckduckgo),
        ]
        .into_iter()
        .filter_map(|(kind, quota)| quota.map(|q| (kind, q)))
        .collect()
    }
}

/// Configuration for the legal search engine.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour. Deserialises from a TOML table
/// with every field optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Provider fallback order. The first provider is tried first.
    pub providers: Vec<ProviderKind>,
    /// Google CSE settings.
    pub google: GoogleCseConfig,
    /// Tavily settings.
    pub tavily: TavilyConfig,
    /// DuckDuckGo settings.
    pub duckduckgo: DuckDuckGoConfig,
    /// Timeout for a single provider call, in milliseconds.
    pub provider_timeout_ms: u64,
    /// Timeout for a single semantic scorer call, in milliseconds.
    pub semantic_timeout_ms: u64,
    /// Overall latency budget of one search, in milliseconds.
    pub request_timeout_ms: u64,
    /// Spacing between the start of consecutive domain queries, in milliseconds.
    pub inter_query_delay_ms: u64,
    /// Domains queried at the same time.
    pub max_concurrent_domains: usize,
    /// Semantic scorer calls in flight at the same time.
    pub semantic_concurrency: usize,
    /// Results requested from a provider per domain.
    pub per_domain_results: usize,
    /// Candidate pool size as a multiple of `max_results`.
    pub pool_multiplier: usize,
    /// Lower bound on the candidate pool size.
    pub min_pool_size: usize,
    /// BM25 parameters.
    pub bm25: Bm25Params,
    /// Reciprocal rank fusion constant.
    pub rrf_k: f64,
    /// How domain authority enters the final ordering.
    pub authority_mode: AuthorityMode,
    /// Provider quotas.
    pub quotas: QuotaConfig,
    /// Rate-limit back-off.
    pub backoff: CircuitBreakerConfig,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            providers: ProviderKind::default_order(),
            google: GoogleCseConfig::default(),
            tavily: TavilyConfig::default(),
            duckduckgo: DuckDuckGoConfig::default(),
            provider_timeout_ms: 8_000,
            semantic_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
            inter_query_delay_ms: 300,
            max_concurrent_domains: 4,
            semantic_concurrency: 4,
            per_domain_results: 10,
            pool_multiplier: 3,
            min_pool_size: 30,
            bm25: Bm25Params::default(),
            rrf_k: 60.0,
            authority_mode: AuthorityMode::default(),
            quotas: QuotaConfig::default(),
            backoff: CircuitBreakerConfig::default(),
            user_agent: None,
        }
    }
}

impl EngineConfig {
    /// Per-provider call timeout.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Per-call semantic scorer timeout.
    pub fn semantic_timeout(&self) -> Duration {
        Duration::from_millis(self.semantic_timeout_ms)
    }

    /// Whole-request latency budget.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Spacing between domain queries.
    pub fn inter_query_delay(&self) -> Duration {
        Duration::from_millis(self.inter_query_delay_ms)
    }

    /// Candidate pool cap for a request asking for `max_results`.
    pub fn pool_cap(&self, max_results: usize) -> usize {
        max_results
            .saturating_mul(self.pool_multiplier)
            .max(self.min_pool_size)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] naming the offending field.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.providers.is_empty() {
            return Err(SearchError::Config(
                "at least one provider must be enabled".into(),
            ));
        }
        for (i, kind) in self.providers.iter().enumerate() {
            if self.providers[..i].contains(kind) {
                return Err(SearchError::Config(format!(
                    "provider {kind} listed twice"
                )));
            }
        }
        for (name, value) in [
            ("provider_timeout_ms", self.provider_timeout_ms),
            ("semantic_timeout_ms", self.semantic_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 {
                return Err(SearchError::Config(format!(
                    "{name} must be greater than 0"
                )));
            }
        }
        for (name, value) in [
            ("max_concurrent_domains", self.max_concurrent_domains),
            ("semantic_concurrency", self.semantic_concurrency),
            ("per_domain_results", self.per_domain_results),
            ("pool_multiplier", self.pool_multiplier),
        ] {
            if value == 0 {
                return Err(SearchError::Config(format!(
                    "{name} must be greater than 0"
                )));
            }
        }
        if !self.bm25.k1.is_finite() || self.bm25.k1 < 0.0 {
            return Err(SearchError::Config(
                "bm25.k1 must be a non-negative number".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(SearchError::Config("bm25.b must lie in [0, 1]".into()));
        }
        if !self.rrf_k.is_finite() || self.rrf_k <= 0.0 {
            return Err(SearchError::Config("rrf_k must be positive".into()));
        }
        for (kind, quota) in self.quotas.to_map() {
            if quota.max_queries == 0 || quota.window_secs == 0 {
                return Err(SearchError::Config(format!(
                    "quota for {kind} must allow at least one query per non-empty window"
                )));
            }
        }
        if self.backoff.failure_threshold == 0 {
            return Err(SearchError::Config(
                "backoff.failure_threshold must be greater than 0".into(),
            ));
        }
        if self.backoff.base_cooldown_secs > self.backoff.max_cooldown_secs {
            return Err(SearchError::Config(
                "backoff.base_cooldown_secs must be <= max_cooldown_secs".into(),
            ));
        }
        Ok(())
    }
}
