//! Reciprocal rank fusion of the scoring signals.
//!
//! Pure and deterministic: the same candidates with the same scores always
//! produce the same output. Each active signal contributes a ranking
//! (descending score, ties by discovery order); a candidate's fused score
//! is `Σ 1/(k + rank)` over those rankings. The authority weight of the
//! domain it came from is a secondary adjustment: it never reorders a
//! lexical-only fusion, so that case always keeps the BM25 order.

use serde::{Deserialize, Serialize};

use crate::types::{ScoredResult, SearchResult};

/// How a domain's authority weight enters the final ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityMode {
    /// `fused_score = rrf * authority_weight` when two or more rankings are
    /// fused. Can reorder results that are close in RRF score across
    /// domains.
    Multiply,
    /// `fused_score = rrf`; authority only breaks exact ties.
    #[default]
    TieBreak,
}

/// One member of the candidate pool with its normalised signals.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// The deduplicated result.
    pub result: SearchResult,
    /// Authority weight of the originating domain.
    pub authority: f64,
    /// Normalised lexical score.
    pub lexical: f64,
    /// Normalised semantic score, 0 when unavailable.
    pub semantic: f64,
    /// Normalised legal-context score, 0 when unused.
    pub legal: f64,
}

/// Which signals take part in the fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signals {
    /// Include the semantic ranking.
    pub semantic: bool,
    /// Include the legal-context ranking.
    pub legal: bool,
}

/// Cut-off and fusion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    /// RRF smoothing constant.
    pub rrf_k: f64,
    /// Authority adjustment.
    pub authority_mode: AuthorityMode,
    /// Minimum relevance to survive.
    pub min_relevancy: f64,
    /// Maximum number of results.
    pub max_results: usize,
}

/// 1-based rank of every index when sorted by `scores` descending.
///
/// Equal scores keep their input order.
pub fn rank_positions(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    let mut ranks = vec![0; scores.len()];
    for (position, index) in order.into_iter().enumerate() {
        ranks[index] = position + 1;
    }
    ranks
}

/// Fuse, filter, truncate and rank the candidate pool.
///
/// Candidates must be in discovery order. Relevance is the better of the
/// normalised lexical and semantic scores; candidates below
/// `min_relevancy` are dropped before truncation to `max_results`.
pub fn fuse(candidates: Vec<Candidate>, signals: Signals, params: &FusionParams) -> Vec<ScoredResult> {
    let lexical: Vec<f64> = candidates.iter().map(|c| c.lexical).collect();
    let mut rankings = vec![rank_positions(&lexical)];
    if signals.semantic {
        let semantic: Vec<f64> = candidates.iter().map(|c| c.semantic).collect();
        rankings.push(rank_positions(&semantic));
    }
    if signals.legal {
        let legal: Vec<f64> = candidates.iter().map(|c| c.legal).collect();
        rankings.push(rank_positions(&legal));
    }

    let weigh_authority = params.authority_mode == AuthorityMode::Multiply && rankings.len() > 1;
    let fused: Vec<f64> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let rrf: f64 = rankings
                .iter()
                .map(|ranks| 1.0 / (params.rrf_k + ranks[i] as f64))
                .sum();
            if weigh_authority { rrf * c.authority } else { rrf }
        })
        .collect();

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        fused[b]
            .total_cmp(&fused[a])
            .then_with(|| candidates[b].authority.total_cmp(&candidates[a].authority))
            .then_with(|| a.cmp(&b))
    });

    let mut slots: Vec<Option<Candidate>> = candidates.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| {
            let candidate = slots[i].take()?;
            let relevance = if signals.semantic {
                candidate.lexical.max(candidate.semantic)
            } else {
                candidate.lexical
            };
            (relevance >= params.min_relevancy).then_some((candidate, relevance, fused[i]))
        })
        .take(params.max_results)
        .enumerate()
        .map(|(position, (candidate, relevance, fused_score))| ScoredResult {
            result: candidate.result,
            lexical_score: candidate.lexical,
            semantic_score: if signals.semantic { candidate.semantic } else { 0.0 },
            relevance,
            fused_score,
            fused_rank: position + 1,
        })
        .collect()
}
