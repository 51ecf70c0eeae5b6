//! Relevancy scoring of the candidate pool.
//!
//! Produces three signals per candidate, each min-max normalised to
//! `[0, 1]` across the pool:
//!
//! - lexical: BM25 of the (optionally normalised) query
//! - semantic: the injected [`SemanticScorer`], when present and working
//! - legal context: agreement of legal areas, experimental methodology only
//!
//! Semantic calls are the only suspension points. Every call has its own
//! timeout and the whole batch stops at the request deadline; whatever
//! is missing then scores zero.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;

use crate::config::Bm25Params;
use crate::error::ScoringError;
use crate::legal::{legal_context_score, normalize_query};
use crate::semantic::SemanticScorer;
use crate::types::{Methodology, SearchResult};

use super::bm25::{bm25_scores, query_terms};

/// Min-max scale `values` into `[0, 1]`.
///
/// An all-equal pool maps to 1.0 when the common value is positive and
/// to 0.0 otherwise, so a pool where nothing matched never passes a
/// relevancy threshold. Non-finite inputs count as zero.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let clean: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() { *v } else { 0.0 })
        .collect();
    let Some(min) = clean.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = clean.iter().copied().fold(min, f64::max);
    let range = max - min;

    if range <= f64::EPSILON {
        let fill = if max > 0.0 { 1.0 } else { 0.0 };
        return vec![fill; clean.len()];
    }
    clean.iter().map(|v| ((v - min) / range).clamp(0.0, 1.0)).collect()
}

/// Text BM25 and the legal-context signal see for a candidate.
pub(crate) fn document_text(result: &SearchResult) -> String {
    format!("{} {}", result.title, result.snippet)
}

/// Normalised per-candidate signals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolScores {
    /// Normalised BM25.
    pub lexical: Vec<f64>,
    /// Normalised semantic scores, `None` when not a single call succeeded.
    pub semantic: Option<Vec<f64>>,
    /// Normalised legal-context scores, experimental methodology only.
    pub legal: Option<Vec<f64>>,
    /// Semantic calls that failed or timed out.
    pub semantic_failures: usize,
    /// Whether the request deadline cut semantic scoring short.
    pub semantic_cut_off: bool,
}

/// Settings for one scoring pass.
#[derive(Debug, Clone, Copy)]
pub struct ScoringParams {
    /// BM25 parameters.
    pub bm25: Bm25Params,
    /// Per-call semantic timeout.
    pub semantic_timeout: Duration,
    /// Semantic calls in flight at once.
    pub semantic_concurrency: usize,
    /// Instant after which no more semantic results are awaited.
    pub deadline: Instant,
}

/// Lexical BM25 of `query` over the pool, raw (unnormalised).
pub fn lexical_scores(
    query: &str,
    pool: &[SearchResult],
    methodology: Methodology,
    params: Bm25Params,
) -> Vec<f64> {
    let query = if methodology.preprocesses_query() {
        normalize_query(query)
    } else {
        query.to_owned()
    };
    let documents: Vec<String> = pool.iter().map(document_text).collect();
    bm25_scores(&query_terms(&query), &documents, params)
}

/// Raw semantic score for every candidate, `None` where the call failed.
///
/// Values are clamped to `[0, 1]`; non-finite values count as failures.
/// Returns the scores and whether the deadline was hit.
pub async fn semantic_scores(
    scorer: &Arc<dyn SemanticScorer>,
    query: &str,
    pool: &[SearchResult],
    timeout: Duration,
    concurrency: usize,
    deadline: Instant,
) -> (Vec<Option<f64>>, bool) {
    let mut scores: Vec<Option<f64>> = vec![None; pool.len()];

    let mut calls = futures::stream::iter(pool.iter().enumerate())
        .map(|(i, result)| async move {
            let outcome =
                match tokio::time::timeout(timeout, scorer.score(query, &result.title, &result.snippet))
                    .await
                {
                    Ok(Ok(value)) if value.is_finite() => Ok(value.clamp(0.0, 1.0)),
                    Ok(Ok(value)) => Err(ScoringError::Unavailable(format!(
                        "scorer returned non-finite value {value}"
                    ))),
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(ScoringError::Timeout(format!(
                        "no answer within {} ms",
                        timeout.as_millis()
                    ))),
                };
            (i, outcome)
        })
        .buffer_unordered(concurrency.max(1));

    let mut cut_off = false;
    loop {
        match tokio::time::timeout_at(deadline, calls.next()).await {
            Ok(Some((i, Ok(value)))) => scores[i] = Some(value),
            Ok(Some((i, Err(e)))) => {
                tracing::warn!(
                    scorer = scorer.name(),
                    candidate = i,
                    code = e.code(),
                    error = %e,
                    "semantic scoring failed"
                );
            }
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(scorer = scorer.name(), "request deadline reached during semantic scoring");
                cut_off = true;
                break;
            }
        }
    }

    (scores, cut_off)
}

/// Compute every signal the methodology asks for.
pub async fn score_pool(
    query: &str,
    pool: &[SearchResult],
    methodology: Methodology,
    scorer: Option<&Arc<dyn SemanticScorer>>,
    params: ScoringParams,
) -> PoolScores {
    let lexical = min_max_normalize(&lexical_scores(query, pool, methodology, params.bm25));

    let mut semantic = None;
    let mut semantic_failures = 0;
    let mut semantic_cut_off = false;
    if let (true, Some(scorer)) = (methodology.uses_semantic(), scorer) {
        let (raw, cut_off) = semantic_scores(
            scorer,
            query,
            pool,
            params.semantic_timeout,
            params.semantic_concurrency,
            params.deadline,
        )
        .await;
        semantic_cut_off = cut_off;
        semantic_failures = raw.iter().filter(|s| s.is_none()).count();
        if raw.iter().any(Option::is_some) {
            let filled: Vec<f64> = raw.iter().map(|s| s.unwrap_or(0.0)).collect();
            semantic = Some(min_max_normalize(&filled));
        }
    }

    let legal = methodology.uses_legal_context().then(|| {
        let raw: Vec<f64> = pool
            .iter()
            .map(|r| legal_context_score(query, &document_text(r)))
            .collect();
        min_max_normalize(&raw)
    });

    PoolScores {
        lexical,
        semantic,
        legal,
        semantic_failures,
        semantic_cut_off,
    }
}
