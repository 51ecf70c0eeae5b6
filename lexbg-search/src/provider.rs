//! Trait definition for search provider backends.
//!
//! Each provider (Google CSE, Tavily, DuckDuckGo) implements
//! [`SearchProvider`] to give the orchestrator a uniform, site-restricted
//! search call.

use crate::domains::DomainConfig;
use crate::error::ProviderError;
use crate::types::{ProviderKind, SearchResult};

/// A search provider backend.
///
/// Implementors query one external service and return normalised
/// [`SearchResult`] values. Each provider handles its own:
///
/// - request construction, including site restriction to `domain`
/// - mapping of provider-specific throttling and auth responses onto
///   [`ProviderError`] kinds
/// - normalisation of missing fields to the empty string
///
/// All implementations must be `Send + Sync` for concurrent domain queries.
pub trait SearchProvider: Send + Sync {
    /// Search for `query`, restricted to `domain` when given.
    ///
    /// Returns at most `max_results` results. An empty answer from the
    /// provider is [`ProviderError::NoResults`], never `Ok(vec![])`.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::RateLimited`] when the provider throttles
    /// - [`ProviderError::AuthFailed`] when credentials are missing or rejected
    /// - [`ProviderError::Network`] on transport failure or unexpected status
    /// - [`ProviderError::NoResults`] when nothing matched
    fn search(
        &self,
        query: &str,
        domain: Option<&DomainConfig>,
        max_results: usize,
    ) -> impl std::future::Future<Output = Result<Vec<SearchResult>, ProviderError>> + Send;

    /// Which provider this implementation represents.
    fn kind(&self) -> ProviderKind;

    /// Whether the credentials this provider needs are present.
    ///
    /// An unconfigured provider is skipped before any quota is spent.
    fn is_configured(&self) -> bool {
        true
    }
}
