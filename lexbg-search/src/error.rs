//! Error types for the lexbg-search crate.
//!
//! Provider and scoring errors are local: the orchestrator always absorbs
//! them and degrades. Only [`SearchError`] reaches the caller. Every
//! variant carries a stable SCREAMING_SNAKE_CASE code for programmatic
//! handling. No API keys appear in error messages.

/// Stable error codes, part of the public contract.
pub mod error_codes {
    /// Provider quota exhausted or provider-side throttling.
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    /// Missing or rejected credentials.
    pub const AUTH_FAILED: &str = "AUTH_FAILED";
    /// Transport failure, timeout or unexpected upstream status.
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    /// Provider answered but had nothing for the query.
    pub const NO_RESULTS: &str = "NO_RESULTS";
    /// Semantic scorer failed or is not configured.
    pub const SEMANTIC_UNAVAILABLE: &str = "SEMANTIC_UNAVAILABLE";
    /// Semantic scorer did not answer within its budget.
    pub const SEMANTIC_TIMEOUT: &str = "SEMANTIC_TIMEOUT";
    /// Every provider failed for every domain.
    pub const ALL_PROVIDERS_FAILED: &str = "ALL_PROVIDERS_FAILED";
    /// Malformed search request.
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    /// Invalid engine configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    /// Legal document could not be fetched or extracted.
    pub const DOCUMENT_ERROR: &str = "DOCUMENT_ERROR";
}

/// Failure of a single provider adapter call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Quota exhausted locally or throttled by the provider.
    #[error("[{}] {}", error_codes::RATE_LIMITED, .0)]
    RateLimited(String),

    /// Credentials missing or rejected.
    #[error("[{}] {}", error_codes::AUTH_FAILED, .0)]
    AuthFailed(String),

    /// Transport error, timeout, or unexpected status.
    #[error("[{}] {}", error_codes::NETWORK_ERROR, .0)]
    Network(String),

    /// The provider returned an empty result list.
    #[error("[{}] {}", error_codes::NO_RESULTS, .0)]
    NoResults(String),
}

impl ProviderError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited(_) => error_codes::RATE_LIMITED,
            Self::AuthFailed(_) => error_codes::AUTH_FAILED,
            Self::Network(_) => error_codes::NETWORK_ERROR,
            Self::NoResults(_) => error_codes::NO_RESULTS,
        }
    }

    /// Whether this failure should count towards provider back-off.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Failure of the semantic scoring capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    /// The scorer failed, is misconfigured, or returned garbage.
    #[error("[{}] {}", error_codes::SEMANTIC_UNAVAILABLE, .0)]
    Unavailable(String),

    /// The scorer exceeded its per-call timeout.
    #[error("[{}] {}", error_codes::SEMANTIC_TIMEOUT, .0)]
    Timeout(String),
}

impl ScoringError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => error_codes::SEMANTIC_UNAVAILABLE,
            Self::Timeout(_) => error_codes::SEMANTIC_TIMEOUT,
        }
    }
}

/// Errors surfaced to callers of the search core.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Every domain/provider combination failed and nothing was collected.
    #[error("[{}] all providers failed: {}", error_codes::ALL_PROVIDERS_FAILED, .0)]
    AllProvidersFailed(String),

    /// The request was rejected before any network call.
    #[error("[{}] invalid request: {}", error_codes::INVALID_REQUEST, .0)]
    InvalidRequest(String),

    /// The engine configuration is invalid.
    #[error("[{}] config error: {}", error_codes::CONFIG_INVALID, .0)]
    Config(String),

    /// A legal document could not be fetched or had no readable text.
    #[error("[{}] document error: {}", error_codes::DOCUMENT_ERROR, .0)]
    Document(String),
}

impl SearchError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllProvidersFailed(_) => error_codes::ALL_PROVIDERS_FAILED,
            Self::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            Self::Config(_) => error_codes::CONFIG_INVALID,
            Self::Document(_) => error_codes::DOCUMENT_ERROR,
        }
    }
}

/// Convenience type alias for lexbg-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
