//! Core types: results, requests, provider identification.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domains::DomainConfig;
use crate::error::SearchError;

/// A single normalised search result produced by a provider adapter.
///
/// Identified by its URL (after normalisation) for deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title. Empty when the provider omitted it.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Text snippet. Empty when the provider omitted it.
    pub snippet: String,
    /// Registry key of the domain this result was collected for
    /// (e.g. `lex_bg`). Adapters fill in the queried host; the
    /// orchestrator replaces it with the registry key.
    pub source_domain: String,
    /// Which adapter produced this result.
    pub provider: ProviderKind,
}

/// A search result after scoring and fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    /// The underlying result.
    #[serde(flatten)]
    pub result: SearchResult,
    /// BM25 score, min-max normalised across the candidate pool.
    pub lexical_score: f64,
    /// Semantic score, min-max normalised across the candidate pool.
    /// Zero when the semantic scorer was unavailable.
    pub semantic_score: f64,
    /// Relevance the `min_relevancy` threshold was checked against:
    /// the better of the two normalised scores.
    pub relevance: f64,
    /// Reciprocal-rank-fusion score after the authority adjustment.
    pub fused_score: f64,
    /// 1-based position in the final ordering.
    pub fused_rank: usize,
}

/// Supported search providers, in no particular order.
///
/// The fallback order is configuration, not a property of the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Google Custom Search JSON API. Needs an API key and engine id.
    GoogleCse,
    /// Tavily search API. Needs an API key.
    Tavily,
    /// DuckDuckGo HTML endpoint. Keyless, throttles without notice.
    DuckDuckGo,
}

impl ProviderKind {
    /// Human-readable provider name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GoogleCse => "GoogleCSE",
            Self::Tavily => "Tavily",
            Self::DuckDuckGo => "DuckDuckGo",
        }
    }

    /// Default fallback order: Google CSE, then Tavily, then DuckDuckGo.
    pub fn default_order() -> Vec<ProviderKind> {
        vec![Self::GoogleCse, Self::Tavily, Self::DuckDuckGo]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How much work the scoring stage does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Methodology {
    /// Query normalisation, BM25 and semantic scoring fused with RRF.
    #[default]
    Enhanced,
    /// BM25 only on the raw query. The semantic scorer is never called.
    Standard,
    /// Enhanced plus a legal-context ranking as a third RRF input.
    Experimental,
}

impl Methodology {
    /// Whether the query goes through typo correction and abbreviation expansion.
    pub fn preprocesses_query(&self) -> bool {
        !matches!(self, Self::Standard)
    }

    /// Whether the semantic scorer is consulted.
    pub fn uses_semantic(&self) -> bool {
        !matches!(self, Self::Standard)
    }

    /// Whether the legal-context signal joins the fusion.
    pub fn uses_legal_context(&self) -> bool {
        matches!(self, Self::Experimental)
    }
}

impl std::str::FromStr for Methodology {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enhanced" => Ok(Self::Enhanced),
            "standard" => Ok(Self::Standard),
            "experimental" => Ok(Self::Experimental),
            other => Err(SearchError::InvalidRequest(format!(
                "unknown methodology '{other}'"
            ))),
        }
    }
}

/// A single search call. Immutable once built.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Free-text legal query, usually Bulgarian.
    pub query: String,
    /// Domains to search, in priority order.
    pub domains: Vec<DomainConfig>,
    /// Maximum number of results to return.
    pub max_results: usize,
    /// Minimum relevance in `[0, 1]` a result must reach.
    pub min_relevancy: f64,
    /// Scoring methodology.
    pub methodology: Methodology,
}

impl SearchRequest {
    /// Build a request with the default limits (15 results, 0.3 relevancy).
    pub fn new(query: impl Into<String>, domains: Vec<DomainConfig>) -> Self {
        Self {
            query: query.into(),
            domains,
            max_results: 15,
            min_relevancy: 0.3,
            methodology: Methodology::default(),
        }
    }

    /// Set the result limit.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the relevancy threshold.
    pub fn with_min_relevancy(mut self, min_relevancy: f64) -> Self {
        self.min_relevancy = min_relevancy;
        self
    }

    /// Set the scoring methodology.
    pub fn with_methodology(mut self, methodology: Methodology) -> Self {
        self.methodology = methodology;
        self
    }

    /// Reject malformed requests before any network call is issued.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidRequest`] when the query is blank,
    /// `max_results` is zero, `min_relevancy` lies outside `[0, 1]`, or no
    /// domain is given.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.query.trim().is_empty() {
            return Err(SearchError::InvalidRequest(
                "query must not be empty".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(SearchError::InvalidRequest(
                "max_results must be greater than 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_relevancy) {
            return Err(SearchError::InvalidRequest(format!(
                "min_relevancy must lie in [0, 1], got {}",
                self.min_relevancy
            )));
        }
        if self.domains.is_empty() {
            return Err(SearchError::InvalidRequest(
                "at least one domain must be given".into(),
            ));
        }
        for domain in &self.domains {
            domain
                .validate()
                .map_err(|e| SearchError::InvalidRequest(e.to_string()))?;
        }
        Ok(())
    }
}

/// Final answer of a search call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Results in fused order, `fused_rank` 1..N.
    pub results: Vec<ScoredResult>,
    /// Size of the deduplicated candidate pool that was scored.
    pub candidate_count: usize,
    /// Human-readable notes on anything that degraded (failed domains,
    /// missing semantic scores, deadline reached). Empty on a clean run.
    pub degradations: Vec<String>,
}

impl SearchOutcome {
    /// Whether any part of the pipeline degraded.
    pub fn is_partial(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// Extracted readable content from a fetched web page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    /// The URL that was fetched.
    pub url: String,
    /// The page title extracted from HTML.
    pub title: String,
    /// Cleaned text with boilerplate stripped.
    pub text: String,
    /// Number of words in the extracted text.
    pub word_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::DomainRegistry;

    fn lex_bg() -> DomainConfig {
        DomainRegistry::builtin()
            .get("lex_bg")
            .cloned()
            .expect("lex_bg is built in")
    }

    #[test]
    fn provider_kind_display() {
        assert_eq!(ProviderKind::GoogleCse.to_string(), "GoogleCSE");
        assert_eq!(ProviderKind::Tavily.to_string(), "Tavily");
        assert_eq!(ProviderKind::DuckDuckGo.to_string(), "DuckDuckGo");
    }

    #[test]
    fn default_provider_order() {
        assert_eq!(
            ProviderKind::default_order(),
            vec![
                ProviderKind::GoogleCse,
                ProviderKind::Tavily,
                ProviderKind::DuckDuckGo
            ]
        );
    }

    #[test]
    fn provider_kind_serde_snake_case() {
        let json = serde_json::to_string(&ProviderKind::DuckDuckGo).expect("serialize");
        assert_eq!(json, "\"duck_duck_go\"");
        let decoded: ProviderKind = serde_json::from_str("\"google_cse\"").expect("deserialize");
        assert_eq!(decoded, ProviderKind::GoogleCse);
    }

    #[test]
    fn methodology_parse() {
        assert_eq!("enhanced".parse::<Methodology>().ok(), Some(Methodology::Enhanced));
        assert_eq!(" Standard ".parse::<Methodology>().ok(), Some(Methodology::Standard));
        assert_eq!(
            "experimental".parse::<Methodology>().ok(),
            Some(Methodology::Experimental)
        );
        assert!("fancy".parse::<Methodology>().is_err());
    }

    #[test]
    fn methodology_switches() {
        assert!(!Methodology::Standard.uses_semantic());
        assert!(Methodology::Enhanced.uses_semantic());
        assert!(!Methodology::Enhanced.uses_legal_context());
        assert!(Methodology::Experimental.uses_legal_context());
    }

    #[test]
    fn valid_request_passes() {
        let request = SearchRequest::new("обезщетение", vec![lex_bg()]);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn blank_query_rejected() {
        let request = SearchRequest::new("   ", vec![lex_bg()]);
        let err = request.validate().unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn zero_max_results_rejected() {
        let request = SearchRequest::new("договор", vec![lex_bg()]).with_max_results(0);
        assert!(request.validate().unwrap_err().to_string().contains("max_results"));
    }

    #[test]
    fn relevancy_outside_unit_interval_rejected() {
        for bad in [-0.1, 1.5, f64::NAN] {
            let request = SearchRequest::new("договор", vec![lex_bg()]).with_min_relevancy(bad);
            assert!(request.validate().is_err(), "accepted {bad}");
        }
        let edge = SearchRequest::new("договор", vec![lex_bg()]).with_min_relevancy(1.0);
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn empty_domain_list_rejected() {
        let request = SearchRequest::new("договор", vec![]);
        assert!(request.validate().unwrap_err().to_string().contains("domain"));
    }

    #[test]
    fn scored_result_serialises_flat() {
        let scored = ScoredResult {
            result: SearchResult {
                title: "Закон за задълженията и договорите".into(),
                url: "https://lex.bg/laws/ldoc/2121934337".into(),
                snippet: "чл. 45".into(),
                source_domain: "lex_bg".into(),
                provider: ProviderKind::GoogleCse,
            },
            lexical_score: 1.0,
            semantic_score: 0.5,
            relevance: 1.0,
            fused_score: 0.03,
            fused_rank: 1,
        };
        let json = serde_json::to_value(&scored).expect("serialize");
        assert_eq!(json["url"], "https://lex.bg/laws/ldoc/2121934337");
        assert_eq!(json["fused_rank"], 1);
        assert_eq!(json["provider"], "google_cse");
    }

    #[test]
    fn outcome_partial_flag() {
        let mut outcome = SearchOutcome::default();
        assert!(!outcome.is_partial());
        outcome.degradations.push("semantic scorer unavailable".into());
        assert!(outcome.is_partial());
    }
}
