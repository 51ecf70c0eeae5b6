//! # lexbg
//!
//! Command-line host for the `lexbg-search` legal search core.
//!
//! This crate owns everything around the search core that touches the
//! outside world: the TOML configuration file and environment secrets,
//! the OpenAI-compatible semantic scorers and the text rendering used by
//! the `lexbg` binary.

pub mod config;
pub mod error;
pub mod render;
pub mod scorers;

pub use config::{AppConfig, RequestDefaults, SemanticConfig, SemanticMode};
pub use error::{AppError, Result};

use lexbg_search::{LegalSearch, Methodology, SearchRequest};

/// Per-invocation overrides of the `[request]` defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    /// Domain keys; empty keeps the configured selection.
    pub domains: Vec<String>,
    /// Maximum number of results.
    pub max_results: Option<usize>,
    /// Relevance threshold.
    pub min_relevancy: Option<f64>,
    /// Scoring methodology.
    pub methodology: Option<Methodology>,
}

/// Build the search engine described by `config`, with its semantic
/// scorer attached when one is configured.
///
/// # Errors
///
/// Returns an error if the engine configuration is invalid or the
/// scorer's HTTP client cannot be built.
pub fn build_engine(config: &AppConfig) -> Result<LegalSearch> {
    let engine = LegalSearch::new(config.search.clone())?;
    Ok(match scorers::build_scorer(&config.semantic)? {
        Some(scorer) => engine.with_semantic_scorer(scorer),
        None => engine,
    })
}

/// Build a validated request from the configured defaults and overrides.
///
/// Without any domain selection every registry domain is searched in
/// priority order.
///
/// # Errors
///
/// Returns an error for an unknown domain key or an invalid request.
pub fn build_request(
    config: &AppConfig,
    query: &str,
    overrides: &RequestOverrides,
) -> Result<SearchRequest> {
    let registry = config.registry()?;
    let keys = if overrides.domains.is_empty() {
        &config.request.domains
    } else {
        &overrides.domains
    };
    let domains = if keys.is_empty() {
        registry.prioritized()
    } else {
        registry.resolve(keys)?
    };

    let request = SearchRequest::new(query, domains)
        .with_max_results(overrides.max_results.unwrap_or(config.request.max_results))
        .with_min_relevancy(
            overrides
                .min_relevancy
                .unwrap_or(config.request.min_relevancy),
        )
        .with_methodology(overrides.methodology.unwrap_or(config.request.methodology));
    request.validate()?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_defaults() {
        let config = AppConfig::default();
        let request =
            build_request(&config, "обезщетение", &RequestOverrides::default()).expect("request");
        assert_eq!(request.max_results, 15);
        assert_eq!(request.methodology, Methodology::Enhanced);
        assert_eq!(request.domains.len(), config.registry().expect("registry").len());
        assert_eq!(request.domains[0].key, "lex_bg");
    }

    #[test]
    fn overrides_win() {
        let mut config = AppConfig::default();
        config.request.domains = vec!["lex_bg".into()];
        let overrides = RequestOverrides {
            domains: vec!["vks_bg".into(), "dv_bg".into()],
            max_results: Some(3),
            min_relevancy: Some(0.5),
            methodology: Some(Methodology::Standard),
        };
        let request = build_request(&config, "давност", &overrides).expect("request");
        let keys: Vec<&str> = request.domains.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["vks_bg", "dv_bg"]);
        assert_eq!(request.max_results, 3);
        assert_eq!(request.min_relevancy, 0.5);
        assert_eq!(request.methodology, Methodology::Standard);
    }

    #[test]
    fn configured_domains_used_without_override() {
        let mut config = AppConfig::default();
        config.request.domains = vec!["vks_bg".into()];
        let request =
            build_request(&config, "давност", &RequestOverrides::default()).expect("request");
        assert_eq!(request.domains.len(), 1);
        assert_eq!(request.domains[0].key, "vks_bg");
    }

    #[test]
    fn unknown_domain_is_rejected() {
        let overrides = RequestOverrides {
            domains: vec!["nowhere_bg".into()],
            ..Default::default()
        };
        let err = build_request(&AppConfig::default(), "давност", &overrides).unwrap_err();
        assert!(matches!(err, AppError::Search(_)));
    }

    #[test]
    fn blank_query_is_rejected() {
        let err =
            build_request(&AppConfig::default(), "   ", &RequestOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("INVALID_REQUEST"));
    }

    #[test]
    fn engine_builds_without_scorer() {
        assert!(build_engine(&AppConfig::default()).is_ok());
    }
}
