//! Gateway configuration with sensible defaults.
//!
//! [`GatewayConfig`] controls the provider endpoint and credentials,
//! per-call timeouts, the retry budget and how many results are
//! requested. Credentials are optional: without them the gateway serves
//! synthetic results instead of calling out.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::retry::RetryPolicy;

/// Default Custom Search JSON API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Configuration for the search gateway.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Provider API key. Never logged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Programmable search engine id (`cx`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<String>,
    /// Provider endpoint. Overridable so tests can point at a mock server.
    pub base_url: String,
    /// Deadline for a single provider call, in seconds.
    pub timeout_secs: u64,
    /// Total provider attempts per fetch, including the first.
    pub max_attempts: u32,
    /// Backoff unit in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Upper bound for one backoff sleep, in milliseconds.
    pub retry_max_delay_ms: u64,
    /// Results requested per query.
    pub max_results: usize,
    /// Press outlets queried per country for press searches.
    pub press_variants: usize,
    /// User-Agent sent to the provider.
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_secs: 15,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 10_000,
            max_results: 10,
            press_variants: 3,
            user_agent: concat!("reputation-search/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("engine_id", &self.engine_id)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("max_results", &self.max_results)
            .field("press_variants", &self.press_variants)
            .finish()
    }
}

impl GatewayConfig {
    /// Whether both the API key and the engine id are present and non-blank.
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.api_key) && present(&self.engine_id)
    }

    /// Per-call deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy derived from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `timeout_secs` must be greater than 0
    /// - `max_attempts` must be greater than 0
    /// - `max_results` must be between 1 and 10 (provider page size)
    /// - `press_variants` must be greater than 0
    /// - `base_url` must be an absolute http(s) URL
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.timeout_secs == 0 {
            return Err(SearchError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(SearchError::Config(
                "max_attempts must be greater than 0".into(),
            ));
        }
        if self.max_results == 0 || self.max_results > 10 {
            return Err(SearchError::Config(
                "max_results must be between 1 and 10".into(),
            ));
        }
        if self.press_variants == 0 {
            return Err(SearchError::Config(
                "press_variants must be greater than 0".into(),
            ));
        }
        match url::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(SearchError::Config(format!(
                "base_url is not an http(s) URL: {}",
                self.base_url
            ))),
        }
    }
}
