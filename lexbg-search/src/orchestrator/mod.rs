//! Search orchestrator: provider fallback, dedup, scoring, rank fusion.
//!
//! This module fans out one query per legal domain, falls back across
//! providers within each domain, deduplicates the combined results by
//! normalised URL, scores them lexically and semantically, and fuses the
//! rankings into the final ordering.

pub mod bm25;
pub mod dedup;
pub mod fallback;
pub mod fusion;
pub mod scoring;
pub mod search;
pub mod url_normalize;

pub use search::LegalSearch;
