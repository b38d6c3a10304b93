//! Shared HTTP client for provider requests.

use crate::config::GatewayConfig;
use crate::error::SearchError;

/// Build a [`reqwest::Client`] configured for provider calls.
///
/// The client has:
/// - Timeout from config (the gateway also enforces its own deadline)
/// - The configured User-Agent
/// - gzip decompression
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &GatewayConfig) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_with_default_config() {
        assert!(build_client(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn build_client_with_custom_ua() {
        let config = GatewayConfig {
            user_agent: "CustomBot/1.0".into(),
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
    }
}
