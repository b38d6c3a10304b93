//! Error types for the reputation service.

use reputation_search::SearchError;

/// Top-level error type for the reputation service.
#[derive(Debug, thiserror::Error)]
pub enum ReputationError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Rejected request input (empty query, bad country list).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Search layer error.
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Analysis collaborator error.
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Pipeline coordination error (task join failures and the like).
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ReputationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_errors_convert() {
        let err: ReputationError = SearchError::MissingCredentials.into();
        assert_eq!(
            err.to_string(),
            "search error: search provider credentials are not configured"
        );
    }

    #[test]
    fn invalid_request_message() {
        let err = ReputationError::InvalidRequest("query must not be empty".into());
        assert_eq!(err.to_string(), "invalid request: query must not be empty");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ReputationError = io.into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
