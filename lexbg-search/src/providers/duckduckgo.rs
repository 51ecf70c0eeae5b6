//! DuckDuckGo HTML endpoint: keyless last-resort provider.
//!
//! Uses the HTML-only version at `{base}/html/`, which needs no
//! JavaScript. Site restriction is a `site:` prefix on the query. When
//! DuckDuckGo suspects automation it answers 202/403/429 or serves an
//! "anomaly" challenge page with status 200; all of those are throttling.

use scraper::{Html, Selector};
use url::Url;

use super::{provider_query, source_for, transport_error};
use crate::config::DuckDuckGoConfig;
use crate::domains::DomainConfig;
use crate::error::ProviderError;
use crate::provider::SearchProvider;
use crate::types::{ProviderKind, SearchResult};

/// Markers of the bot-challenge page.
const ANOMALY_MARKERS: &[&str] = &["anomaly-modal", "challenge-form", "bots use DuckDuckGo too"];

/// DuckDuckGo HTML scraper.
#[derive(Debug, Clone)]
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
    config: DuckDuckGoConfig,
}

impl DuckDuckGoProvider {
    /// Create an adapter over a shared HTTP client.
    pub fn new(client: reqwest::Client, config: DuckDuckGoConfig) -> Self {
        Self { client, config }
    }

    /// Extract the actual URL from DuckDuckGo's redirect wrapper.
    ///
    /// DDG wraps URLs like: `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`
    /// We parse out the `uddg` query parameter and URL-decode it.
    fn extract_url(href: &str) -> Option<String> {
        let full_href = if href.starts_with("//") {
            format!("https:{href}")
        } else {
            href.to_string()
        };

        let parsed = Url::parse(&full_href).ok()?;

        if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        } else {
            Some(full_href)
        }
    }
}

impl SearchProvider for DuckDuckGoProvider {
    async fn search(
        &self,
        query: &str,
        domain: Option<&DomainConfig>,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let rendered = provider_query(query, domain);
        let q = match domain {
            Some(d) => format!("site:{} {rendered}", d.domain),
            None => rendered,
        };
        tracing::trace!(query = %q, "DuckDuckGo search");

        let params = [("q", q.as_str()), ("kl", self.config.region.as_str())];
        let url = format!("{}/html/", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| transport_error(ProviderKind::DuckDuckGo, e))?;

        let status = response.status().as_u16();
        match status {
            202 | 403 | 429 => {
                return Err(ProviderError::RateLimited(format!(
                    "DuckDuckGo throttled the request (HTTP {status})"
                )))
            }
            s if !(200..300).contains(&s) => {
                return Err(ProviderError::Network(format!(
                    "DuckDuckGo returned HTTP {status}"
                )))
            }
            _ => {}
        }

        let html = response
            .text()
            .await
            .map_err(|e| transport_error(ProviderKind::DuckDuckGo, e))?;
        tracing::trace!(bytes = html.len(), "DuckDuckGo response received");

        if ANOMALY_MARKERS.iter().any(|m| html.contains(m)) {
            return Err(ProviderError::RateLimited(
                "DuckDuckGo served a bot challenge".into(),
            ));
        }

        let results = parse_duckduckgo_html(&html, domain, max_results)?;
        if results.is_empty() {
            return Err(ProviderError::NoResults(
                "DuckDuckGo returned no results".into(),
            ));
        }
        Ok(results)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::DuckDuckGo
    }
}

/// Parse DuckDuckGo HTML response into search results.
///
/// Extracted as a separate function for testability with mock HTML.
pub(crate) fn parse_duckduckgo_html(
    html: &str,
    domain: Option<&DomainConfig>,
    max_results: usize,
) -> Result<Vec<SearchResult>, ProviderError> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse(
        ".result.results_links.results_links_deep:not(.result--ad), .web-result:not(.result--ad)",
    )
    .map_err(|e| ProviderError::Network(format!("invalid result selector: {e:?}")))?;
    let title_sel = Selector::parse(".result__a")
        .map_err(|e| ProviderError::Network(format!("invalid title selector: {e:?}")))?;
    let snippet_sel = Selector::parse(".result__snippet")
        .map_err(|e| ProviderError::Network(format!("invalid snippet selector: {e:?}")))?;

    let mut results = Vec::new();

    for element in document.select(&result_sel) {
        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };
        let Some(url) = title_el
            .value()
            .attr("href")
            .and_then(DuckDuckGoProvider::extract_url)
        else {
            continue;
        };

        let title = title_el.text().collect::<String>().trim().to_string();
        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        results.push(SearchResult {
            title,
            source_domain: source_for(domain, &url),
            url,
            snippet,
            provider: ProviderKind::DuckDuckGo,
        });

        if results.len() >= max_results {
            break;
        }
    }

    tracing::debug!(count = results.len(), "DuckDuckGo results parsed");
    Ok(results)
}
