//! Error types for the lexbg host.

use lexbg_search::SearchError;

/// Top-level error type for the host crate.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration file or value error.
    #[error("config error: {0}")]
    Config(String),

    /// Semantic scorer setup error.
    #[error("scorer error: {0}")]
    Scorer(String),

    /// Error from the search core.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_errors_keep_their_code_in_display() {
        let err = AppError::from(SearchError::InvalidRequest("query must not be empty".into()));
        assert_eq!(
            err.to_string(),
            "[INVALID_REQUEST] invalid request: query must not be empty"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err = AppError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(err.to_string().starts_with("I/O error"));
    }
}
