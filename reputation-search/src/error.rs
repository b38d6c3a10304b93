//! Error types for the reputation-search crate.
//!
//! Messages are stable and never include provider credentials, so they
//! are safe to log and to surface in API responses.

/// Errors that can occur while querying the search provider.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The provider answered with HTTP 429.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider answered with a non-success status other than 429.
    #[error("provider returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body or reason phrase.
        message: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The request exceeded its deadline and was aborted.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// The provider response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// No API key or engine id is configured for the provider.
    #[error("search provider credentials are not configured")]
    MissingCredentials,

    /// The query sanitised down to nothing usable.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid gateway configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Whether this error is the provider signalling rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Configuration and query errors are permanent; everything that came
    /// back from (or failed on the way to) the provider is transient.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            Self::MissingCredentials | Self::InvalidQuery(_) | Self::Config(_)
        )
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key.
        let err = err.without_url();
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

/// Convenience type alias for reputation-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
