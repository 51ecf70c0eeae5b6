//! The legal search pipeline.
//!
//! Query → candidates → scored → fused → filtered/truncated. The only
//! state kept between requests is the provider quota counters and
//! back-off, shared through `Arc` so concurrent searches on the same
//! engine respect the same limits.

use std::sync::Arc;

use futures::StreamExt;
use tokio::time::Instant;

use crate::config::EngineConfig;
use crate::error::SearchError;
use crate::http;
use crate::provider::SearchProvider;
use crate::providers::Provider;
use crate::rate_limit::{Backoff, Clock, RateLimiter, SystemClock};
use crate::semantic::SemanticScorer;
use crate::types::{SearchOutcome, SearchRequest, SearchResult};

use super::dedup::deduplicate;
use super::fallback::{search_domain, DomainOutcome, Guards};
use super::fusion::{fuse, Candidate, FusionParams, Signals};
use super::scoring::{score_pool, ScoringParams};

/// Bulgarian legal search engine.
///
/// Generic over the provider type so tests can script providers; the
/// default is the closed [`Provider`] set built from configuration.
pub struct LegalSearch<P: SearchProvider = Provider> {
    config: EngineConfig,
    providers: Vec<P>,
    limiter: Arc<RateLimiter>,
    backoff: Arc<Backoff>,
    scorer: Option<Arc<dyn SemanticScorer>>,
}

impl LegalSearch<Provider> {
    /// Build the engine with the providers named in `config.providers`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the configuration is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: EngineConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let client = http::build_client(&config)?;
        let providers = Provider::chain(&config, &client);
        Self::with_providers(config, providers)
    }
}

impl<P: SearchProvider> LegalSearch<P> {
    /// Build the engine over an explicit provider chain, tried in the
    /// given order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the configuration is invalid or
    /// the chain is empty.
    pub fn with_providers(config: EngineConfig, providers: Vec<P>) -> Result<Self, SearchError> {
        config.validate()?;
        if providers.is_empty() {
            return Err(SearchError::Config(
                "at least one provider must be enabled".into(),
            ));
        }
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Ok(Self {
            limiter: Arc::new(RateLimiter::new(config.quotas.to_map(), Arc::clone(&clock))),
            backoff: Arc::new(Backoff::new(config.backoff.clone(), clock)),
            config,
            providers,
            scorer: None,
        })
    }

    /// Rebuild the quota and back-off guards on another clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.limiter = Arc::new(RateLimiter::new(self.config.quotas.to_map(), Arc::clone(&clock)));
        self.backoff = Arc::new(Backoff::new(self.config.backoff.clone(), clock));
        self
    }

    /// Share quota counters with other engines in the process.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Share back-off state with other engines in the process.
    pub fn with_backoff(mut self, backoff: Arc<Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    /// Enable semantic scoring.
    pub fn with_semantic_scorer(mut self, scorer: Arc<dyn SemanticScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The quota counters.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// The back-off state.
    pub fn backoff(&self) -> &Arc<Backoff> {
        &self.backoff
    }

    /// Run one search.
    ///
    /// # Pipeline
    ///
    /// 1. Validate the request (no network call on failure)
    /// 2. Query every domain through the provider fallback chain, at most
    ///    `max_concurrent_domains` at once, domain *i* starting no earlier
    ///    than `i * inter_query_delay`
    /// 3. Re-sort the domain outcomes by priority, deduplicate by
    ///    normalised URL (first seen wins) and cap the pool
    /// 4. Score lexically and, when configured, semantically
    /// 5. Fuse with RRF, weight by authority, filter, truncate, rank
    ///
    /// The request deadline bounds steps 2 and 4; whatever is ready when
    /// it passes is used and the outcome carries a degradation note.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidRequest`] for a malformed request
    /// - [`SearchError::AllProvidersFailed`] when every domain failed on
    ///   every provider and nothing was collected
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        request.validate()?;

        let start = Instant::now();
        let deadline = start + self.config.request_timeout();
        let query = request.query.trim();
        tracing::trace!(query, "legal search");
        tracing::info!(
            domains = request.domains.len(),
            max_results = request.max_results,
            methodology = ?request.methodology,
            "search started"
        );

        let mut degradations = Vec::new();
        let outcomes = self.collect_domains(request, query, start, deadline, &mut degradations).await;

        for outcome in outcomes.iter().filter(|o| o.failed()) {
            degradations.push(format!(
                "domain {} yielded no results ({})",
                outcome.domain_key,
                outcome.failure_summary()
            ));
        }

        let all_failed = !outcomes.is_empty() && outcomes.iter().all(DomainOutcome::failed);
        let discovered: Vec<SearchResult> = outcomes.into_iter().flat_map(|o| o.results).collect();
        let pool = deduplicate(discovered, self.config.pool_cap(request.max_results));

        if pool.is_empty() {
            if all_failed {
                return Err(SearchError::AllProvidersFailed(degradations.join("; ")));
            }
            return Ok(SearchOutcome {
                results: Vec::new(),
                candidate_count: 0,
                degradations,
            });
        }

        let scores = score_pool(
            query,
            &pool,
            request.methodology,
            self.scorer.as_ref(),
            ScoringParams {
                bm25: self.config.bm25,
                semantic_timeout: self.config.semantic_timeout(),
                semantic_concurrency: self.config.semantic_concurrency,
                deadline,
            },
        )
        .await;

        if request.methodology.uses_semantic() {
            match (&self.scorer, &scores.semantic) {
                (None, _) => degradations.push("semantic scorer not configured; lexical ranking only".into()),
                (Some(s), None) => degradations.push(format!(
                    "semantic scorer {} unavailable; lexical ranking only",
                    s.name()
                )),
                (Some(s), Some(_)) if scores.semantic_failures > 0 => degradations.push(format!(
                    "semantic scorer {} failed for {} of {} results",
                    s.name(),
                    scores.semantic_failures,
                    pool.len()
                )),
                _ => {}
            }
        }
        if scores.semantic_cut_off {
            degradations.push("request deadline reached during semantic scoring".into());
        }

        let candidate_count = pool.len();
        let candidates: Vec<Candidate> = pool
            .into_iter()
            .enumerate()
            .map(|(i, result)| {
                let authority = request
                    .domains
                    .iter()
                    .find(|d| d.key == result.source_domain)
                    .map_or(1.0, |d| d.authority_weight);
                Candidate {
                    authority,
                    lexical: scores.lexical[i],
                    semantic: scores.semantic.as_ref().map_or(0.0, |s| s[i]),
                    legal: scores.legal.as_ref().map_or(0.0, |l| l[i]),
                    result,
                }
            })
            .collect();

        let results = fuse(
            candidates,
            Signals {
                semantic: scores.semantic.is_some(),
                legal: scores.legal.is_some(),
            },
            &FusionParams {
                rrf_k: self.config.rrf_k,
                authority_mode: self.config.authority_mode,
                min_relevancy: request.min_relevancy,
                max_results: request.max_results,
            },
        );

        tracing::info!(
            candidates = candidate_count,
            returned = results.len(),
            degraded = !degradations.is_empty(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );

        Ok(SearchOutcome {
            results,
            candidate_count,
            degradations,
        })
    }

    /// Query every domain and return the outcomes in priority order.
    async fn collect_domains(
        &self,
        request: &SearchRequest,
        query: &str,
        start: Instant,
        deadline: Instant,
        degradations: &mut Vec<String>,
    ) -> Vec<DomainOutcome> {
        let guards = Guards {
            limiter: &self.limiter,
            backoff: &self.backoff,
        };
        let delay = self.config.inter_query_delay();
        let per_domain = self.config.per_domain_results;
        let provider_timeout = self.config.provider_timeout();

        let mut pending = futures::stream::iter(request.domains.iter().enumerate())
            .map(|(index, domain)| {
                let not_before =
                    start + delay.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
                async move {
                    tokio::time::sleep_until(not_before).await;
                    search_domain(
                        &self.providers,
                        guards,
                        query,
                        domain,
                        index,
                        per_domain,
                        provider_timeout,
                    )
                    .await
                }
            })
            .buffer_unordered(self.config.max_concurrent_domains);

        let mut outcomes = Vec::with_capacity(request.domains.len());
        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => break,
                Err(_) => {
                    let answered: Vec<usize> = outcomes.iter().map(|o: &DomainOutcome| o.index).collect();
                    let abandoned: Vec<&str> = request
                        .domains
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| !answered.contains(i))
                        .map(|(_, d)| d.key.as_str())
                        .collect();
                    tracing::warn!(abandoned = ?abandoned, "request deadline reached while querying domains");
                    degradations.push(format!(
                        "request deadline reached; abandoned domains: {}",
                        abandoned.join(", ")
                    ));
                    break;
                }
            }
        }

        outcomes.sort_by_key(|o| o.index);
        outcomes
    }
}

impl<P: SearchProvider> std::fmt::Debug for LegalSearch<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegalSearch")
            .field("config", &self.config)
            .field("providers", &self.providers.iter().map(P::kind).collect::<Vec<_>>())
            .field("semantic_scorer", &self.scorer.as_ref().map(|s| s.name().to_owned()))
            .finish()
    }
}
