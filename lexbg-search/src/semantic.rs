//! Semantic relevance scoring capability.
//!
//! The search core only knows this trait; the host supplies the
//! implementation (an LLM, an embedding model, a fixture in tests). The
//! scorer is optional and may fail at any time without failing a search.

use async_trait::async_trait;

use crate::error::ScoringError;

/// Scores how well a result answers a query.
///
/// Object-safe so it can be injected as `Arc<dyn SemanticScorer>`.
#[async_trait]
pub trait SemanticScorer: Send + Sync {
    /// Relevance of (`title`, `snippet`) to `query`, nominally in `[0, 1]`.
    ///
    /// Values outside the interval are clamped by the caller; non-finite
    /// values are treated as a failure.
    ///
    /// # Errors
    ///
    /// [`ScoringError::Unavailable`] when the backend is missing, rejects
    /// the call or answers with something unusable.
    async fn score(&self, query: &str, title: &str, snippet: &str) -> Result<f64, ScoringError>;

    /// Short name used in logs and degradation notes.
    fn name(&self) -> &str;
}

/// Scorer that returns a fixed value for every result.
///
/// Useful for wiring checks and as a neutral placeholder.
#[derive(Debug, Clone, Copy)]
pub struct ConstantScorer(pub f64);

#[async_trait]
impl SemanticScorer for ConstantScorer {
    async fn score(&self, _query: &str, _title: &str, _snippet: &str) -> Result<f64, ScoringError> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "constant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Failing;

    #[async_trait]
    impl SemanticScorer for Failing {
        async fn score(&self, _: &str, _: &str, _: &str) -> Result<f64, ScoringError> {
            Err(ScoringError::Unavailable("no backend".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn scorers_are_object_safe() {
        let scorers: Vec<Arc<dyn SemanticScorer>> =
            vec![Arc::new(ConstantScorer(0.5)), Arc::new(Failing)];
        assert_eq!(scorers[0].score("q", "t", "s").await, Ok(0.5));
        let err = scorers[1].score("q", "t", "s").await.unwrap_err();
        assert_eq!(err.code(), "SEMANTIC_UNAVAILABLE");
        assert_eq!(scorers[1].name(), "failing");
    }
}
