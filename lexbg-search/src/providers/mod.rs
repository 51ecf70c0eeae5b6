//! Search provider implementations.
//!
//! Each module provides a struct implementing [`crate::provider::SearchProvider`]
//! for one external service. [`Provider`] is the closed set the
//! orchestrator works with in production.

pub mod duckduckgo;
pub mod google_cse;
pub mod tavily;

pub use duckduckgo::DuckDuckGoProvider;
pub use google_cse::GoogleCseProvider;
pub use tavily::TavilyProvider;

use crate::config::EngineConfig;
use crate::domains::DomainConfig;
use crate::error::ProviderError;
use crate::provider::SearchProvider;
use crate::types::{ProviderKind, SearchResult};
use url::Url;

/// One of the supported providers.
#[derive(Debug, Clone)]
pub enum Provider {
    /// Google Custom Search JSON API.
    GoogleCse(GoogleCseProvider),
    /// Tavily search API.
    Tavily(TavilyProvider),
    /// DuckDuckGo HTML endpoint.
    DuckDuckGo(DuckDuckGoProvider),
}

impl Provider {
    /// Build the adapter for `kind` from the engine configuration.
    pub fn from_config(kind: ProviderKind, config: &EngineConfig, client: reqwest::Client) -> Self {
        match kind {
            ProviderKind::GoogleCse => {
                Self::GoogleCse(GoogleCseProvider::new(client, config.google.clone()))
            }
            ProviderKind::Tavily => Self::Tavily(TavilyProvider::new(client, config.tavily.clone())),
            ProviderKind::DuckDuckGo => {
                Self::DuckDuckGo(DuckDuckGoProvider::new(client, config.duckduckgo.clone()))
            }
        }
    }

    /// The fallback chain in configured order.
    pub fn chain(config: &EngineConfig, client: &reqwest::Client) -> Vec<Self> {
        config
            .providers
            .iter()
            .map(|kind| Self::from_config(*kind, config, client.clone()))
            .collect()
    }
}

impl SearchProvider for Provider {
    async fn search(
        &self,
        query: &str,
        domain: Option<&DomainConfig>,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        match self {
            Self::GoogleCse(p) => p.search(query, domain, max_results).await,
            Self::Tavily(p) => p.search(query, domain, max_results).await,
            Self::DuckDuckGo(p) => p.search(query, domain, max_results).await,
        }
    }

    fn kind(&self) -> ProviderKind {
        match self {
            Self::GoogleCse(_) => ProviderKind::GoogleCse,
            Self::Tavily(_) => ProviderKind::Tavily,
            Self::DuckDuckGo(_) => ProviderKind::DuckDuckGo,
        }
    }

    fn is_configured(&self) -> bool {
        match self {
            Self::GoogleCse(p) => p.has_credentials(),
            Self::Tavily(p) => p.has_api_key(),
            Self::DuckDuckGo(_) => true,
        }
    }
}

/// Query text sent to a provider: the domain's pattern applied when given.
pub(crate) fn provider_query(query: &str, domain: Option<&DomainConfig>) -> String {
    domain.map_or_else(|| query.to_owned(), |d| d.render_query(query))
}

/// Domain a result is attributed to before the orchestrator relabels it.
pub(crate) fn source_for(domain: Option<&DomainConfig>, url: &str) -> String {
    match domain {
        Some(d) => d.domain.clone(),
        None => Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .unwrap_or_default(),
    }
}

/// Transport failure as a [`ProviderError`], with the URL (and any API
/// key in its query string) stripped.
pub(crate) fn transport_error(provider: ProviderKind, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Network(format!("{provider} request timed out"))
    } else {
        ProviderError::Network(format!("{provider} request failed: {}", err.without_url()))
    }
}
