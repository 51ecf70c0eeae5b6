//! Per-domain provider fallback chain.
//!
//! Providers are tried strictly one after another. A provider is skipped
//! without a call when it has no credentials, while it is backing off or
//! when its quota is used up;
//! otherwise it gets one call bounded by the provider timeout. The first
//! non-empty answer wins. Failures never escape: a domain where every
//! provider failed simply yields no results.

use std::time::Duration;

use crate::domains::DomainConfig;
use crate::error::ProviderError;
use crate::provider::SearchProvider;
use crate::rate_limit::{Backoff, RateLimiter};
use crate::types::{ProviderKind, SearchResult};

/// What happened for one domain.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainOutcome {
    /// Position of the domain in the request (its priority).
    pub index: usize,
    /// Registry key of the domain.
    pub domain_key: String,
    /// Results, relabelled with the registry key. Empty on total failure.
    pub results: Vec<SearchResult>,
    /// Provider that answered, if any.
    pub answered_by: Option<ProviderKind>,
    /// Every provider that was skipped or failed, in order.
    pub failures: Vec<(ProviderKind, ProviderError)>,
}

impl DomainOutcome {
    /// Whether no provider answered.
    pub fn failed(&self) -> bool {
        self.answered_by.is_none()
    }

    /// One-line summary of the failures, e.g. `GoogleCSE: RATE_LIMITED`.
    pub fn failure_summary(&self) -> String {
        self.failures
            .iter()
            .map(|(kind, err)| format!("{kind}: {}", err.code()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Shared guards consulted before every provider call.
#[derive(Debug, Clone, Copy)]
pub struct Guards<'a> {
    /// Quota counters.
    pub limiter: &'a RateLimiter,
    /// Rate-limit back-off.
    pub backoff: &'a Backoff,
}

/// Run the provider chain for one domain.
pub async fn search_domain<P: SearchProvider>(
    providers: &[P],
    guards: Guards<'_>,
    query: &str,
    domain: &DomainConfig,
    index: usize,
    max_results: usize,
    provider_timeout: Duration,
) -> DomainOutcome {
    let mut outcome = DomainOutcome {
        index,
        domain_key: domain.key.clone(),
        results: Vec::new(),
        answered_by: None,
        failures: Vec::new(),
    };

    for provider in providers {
        let kind = provider.kind();

        if !provider.is_configured() {
            tracing::debug!(domain = %domain.key, provider = %kind, "provider has no credentials, skipped");
            outcome.failures.push((
                kind,
                ProviderError::AuthFailed(format!("{kind} credentials not configured")),
            ));
            continue;
        }
        if !guards.backoff.should_attempt(kind) {
            tracing::debug!(domain = %domain.key, provider = %kind, "provider backing off, skipped");
            outcome.failures.push((
                kind,
                ProviderError::RateLimited(format!("{kind} is backing off after repeated rate limits")),
            ));
            continue;
        }
        if let Err(err) = guards.limiter.try_acquire(kind) {
            tracing::info!(domain = %domain.key, provider = %kind, "provider quota exhausted, skipped");
            outcome.failures.push((kind, err));
            continue;
        }

        let call = provider.search(query, Some(domain), max_results);
        let result = match tokio::time::timeout(provider_timeout, call).await {
            Ok(Ok(results)) if results.is_empty() => Err(ProviderError::NoResults(format!(
                "{kind} returned an empty list"
            ))),
            Ok(result) => result,
            Err(_) => Err(ProviderError::Network(format!(
                "{kind} timed out after {} ms",
                provider_timeout.as_millis()
            ))),
        };

        match result {
            Ok(mut results) => {
                guards.backoff.record_success(kind);
                results.truncate(max_results);
                for r in &mut results {
                    r.source_domain.clone_from(&domain.key);
                }
                tracing::debug!(
                    domain = %domain.key,
                    provider = %kind,
                    count = results.len(),
                    "domain answered"
                );
                outcome.results = results;
                outcome.answered_by = Some(kind);
                return outcome;
            }
            Err(err) => {
                guards.backoff.record_failure(kind, &err);
                tracing::warn!(
                    domain = %domain.key,
                    provider = %kind,
                    code = err.code(),
                    error = %err,
                    "provider failed, falling back"
                );
                outcome.failures.push((kind, err));
            }
        }
    }

    tracing::info!(
        domain = %domain.key,
        failures = %outcome.failure_summary(),
        "every provider failed for domain"
    );
    outcome
}
