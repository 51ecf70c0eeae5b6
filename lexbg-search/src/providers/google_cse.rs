//! Google Custom Search JSON API: the primary provider.
//!
//! `GET {base}/customsearch/v1` with the API key and engine id. The free
//! tier allows 100 queries a day and at most 10 results per call; quota
//! errors arrive as HTTP 429 or as a 403 whose reason names the limit.

use serde::Deserialize;

use super::{provider_query, source_for, transport_error};
use crate::config::GoogleCseConfig;
use crate::domains::DomainConfig;
use crate::error::ProviderError;
use crate::provider::SearchProvider;
use crate::types::{ProviderKind, SearchResult};

/// Largest `num` the API accepts.
const MAX_RESULTS_PER_CALL: usize = 10;

/// Error reasons Google uses for quota and throttling.
const RATE_LIMIT_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "dailyLimitExceeded",
    "userRateLimitExceeded",
    "quotaExceeded",
    "RATE_LIMIT_EXCEEDED",
];

/// Google Custom Search adapter.
#[derive(Debug, Clone)]
pub struct GoogleCseProvider {
    client: reqwest::Client,
    config: GoogleCseConfig,
}

impl GoogleCseProvider {
    /// Create an adapter over a shared HTTP client.
    pub fn new(client: reqwest::Client, config: GoogleCseConfig) -> Self {
        Self { client, config }
    }

    /// Whether an API key and engine id are configured.
    pub fn has_credentials(&self) -> bool {
        self.credentials().is_some()
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        let key = self.config.api_key.as_deref().filter(|k| !k.is_empty())?;
        let cx = self.config.engine_id.as_deref().filter(|c| !c.is_empty())?;
        Some((key, cx))
    }
}

impl SearchProvider for GoogleCseProvider {
    async fn search(
        &self,
        query: &str,
        domain: Option<&DomainConfig>,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let Some((key, cx)) = self.credentials() else {
            return Err(ProviderError::AuthFailed(
                "Google CSE API key or engine id not configured".into(),
            ));
        };

        let q = provider_query(query, domain);
        tracing::trace!(query = %q, "Google CSE search");

        let num = max_results.clamp(1, MAX_RESULTS_PER_CALL).to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("key", key),
            ("cx", cx),
            ("q", q.as_str()),
            ("num", num.as_str()),
            ("gl", self.config.country.as_str()),
            ("lr", self.config.language.as_str()),
        ];
        if let Some(d) = domain {
            params.push(("siteSearch", d.domain.as_str()));
            params.push(("siteSearchFilter", "i"));
        }

        let url = format!(
            "{}/customsearch/v1",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| transport_error(ProviderKind::GoogleCse, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(ProviderKind::GoogleCse, e))?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }

        let results = parse_cse_json(&body, domain, max_results)?;
        tracing::debug!(count = results.len(), "Google CSE results parsed");
        Ok(results)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::GoogleCse
    }

    fn is_configured(&self) -> bool {
        self.has_credentials()
    }
}

/// Map a non-success HTTP status onto a provider error kind.
fn classify_status(status: u16, body: &str) -> ProviderError {
    let quota_reason = RATE_LIMIT_REASONS.iter().any(|r| body.contains(r));
    match status {
        429 => ProviderError::RateLimited("Google CSE returned HTTP 429".into()),
        403 if quota_reason => {
            ProviderError::RateLimited("Google CSE quota exceeded (HTTP 403)".into())
        }
        400 | 401 | 403 => {
            ProviderError::AuthFailed(format!("Google CSE rejected the request (HTTP {status})"))
        }
        _ => ProviderError::Network(format!("Google CSE returned HTTP {status}")),
    }
}

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Option<Vec<CseItem>>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

/// Parse a Custom Search JSON response into results.
pub(crate) fn parse_cse_json(
    body: &str,
    domain: Option<&DomainConfig>,
    max_results: usize,
) -> Result<Vec<SearchResult>, ProviderError> {
    let parsed: CseResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Network(format!("Google CSE sent invalid JSON: {e}")))?;

    let results: Vec<SearchResult> = parsed
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            let url = item.link.filter(|l| !l.trim().is_empty())?;
            Some(SearchResult {
                title: item.title.unwrap_or_default().trim().to_owned(),
                snippet: item.snippet.unwrap_or_default().trim().to_owned(),
                source_domain: source_for(domain, &url),
                url,
                provider: ProviderKind::GoogleCse,
            })
        })
        .take(max_results)
        .collect();

    if results.is_empty() {
        return Err(ProviderError::NoResults(
            "Google CSE returned no items".into(),
        ));
    }
    Ok(results)
}
