//! Tavily search API: first fallback when Google CSE is exhausted.
//!
//! `POST {base}/search` with a JSON body. Site restriction goes through
//! `include_domains`. Tavily signals plan and credit limits with the
//! non-standard statuses 432 and 433.

use serde::{Deserialize, Serialize};

use super::{provider_query, source_for, transport_error};
use crate::config::TavilyConfig;
use crate::domains::DomainConfig;
use crate::error::ProviderError;
use crate::provider::SearchProvider;
use crate::types::{ProviderKind, SearchResult};

/// Tavily adapter.
#[derive(Debug, Clone)]
pub struct TavilyProvider {
    client: reqwest::Client,
    config: TavilyConfig,
}

impl TavilyProvider {
    /// Create an adapter over a shared HTTP client.
    pub fn new(client: reqwest::Client, config: TavilyConfig) -> Self {
        Self { client, config }
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    include_domains: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Option<Vec<TavilyItem>>,
}

#[derive(Debug, Deserialize)]
struct TavilyItem {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
}

impl SearchProvider for TavilyProvider {
    async fn search(
        &self,
        query: &str,
        domain: Option<&DomainConfig>,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let Some(api_key) = self.api_key() else {
            return Err(ProviderError::AuthFailed(
                "Tavily API key not configured".into(),
            ));
        };

        let q = provider_query(query, domain);
        tracing::trace!(query = %q, "Tavily search");

        let body = TavilyRequest {
            api_key,
            query: &q,
            max_results,
            search_depth: &self.config.search_depth,
            include_domains: domain.map(|d| d.domain.as_str()).into_iter().collect(),
        };

        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(ProviderKind::Tavily, e))?;

        let status = response.status().as_u16();
        match status {
            401 | 403 => {
                return Err(ProviderError::AuthFailed(format!(
                    "Tavily rejected the API key (HTTP {status})"
                )))
            }
            429 | 432 | 433 => {
                return Err(ProviderError::RateLimited(format!(
                    "Tavily limit reached (HTTP {status})"
                )))
            }
            s if !(200..300).contains(&s) => {
                return Err(ProviderError::Network(format!(
                    "Tavily returned HTTP {status}"
                )))
            }
            _ => {}
        }

        let text = response
            .text()
            .await
            .map_err(|e| transport_error(ProviderKind::Tavily, e))?;
        let results = parse_tavily_json(&text, domain, max_results)?;
        tracing::debug!(count = results.len(), "Tavily results parsed");
        Ok(results)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Tavily
    }

    fn is_configured(&self) -> bool {
        self.has_api_key()
    }
}

/// Parse a Tavily search response into results.
pub(crate) fn parse_tavily_json(
    body: &str,
    domain: Option<&DomainConfig>,
    max_results: usize,
) -> Result<Vec<SearchResult>, ProviderError> {
    let parsed: TavilyResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Network(format!("Tavily sent invalid JSON: {e}")))?;

    let results: Vec<SearchResult> = parsed
        .results
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            let url = item.url.filter(|u| !u.trim().is_empty())?;
            Some(SearchResult {
                title: item.title.unwrap_or_default().trim().to_owned(),
                snippet: item.content.unwrap_or_default().trim().to_owned(),
                source_domain: source_for(domain, &url),
                url,
                provider: ProviderKind::Tavily,
            })
        })
        .take(max_results)
        .collect();

    if results.is_empty() {
        return Err(ProviderError::NoResults("Tavily returned no results".into()));
    }
    Ok(results)
}
