//! Resilient access to the search provider.
//!
//! [`SearchGateway::fetch`] never fails: every call either returns the
//! provider's results or, after the retry budget is spent (or when no
//! credentials are configured), a deterministic synthetic set.
//!
//! # Pipeline
//!
//! 1. Unusable query or missing credentials: synthetic results, 0 attempts
//! 2. Call the provider under a per-call deadline
//! 3. On failure, ask the [`RetryPolicy`] for a delay and sleep
//! 4. When the policy gives up, serve synthetic results

use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::error::SearchError;
use crate::fallback::synthetic_results;
use crate::provider::SearchProvider;
use crate::providers::GoogleCseProvider;
use crate::retry::RetryPolicy;
use crate::types::{FetchOutcome, RawResult, ResultOrigin, SearchOptions};

/// Calls a [`SearchProvider`] with deadline, retry and fallback.
#[derive(Clone)]
pub struct SearchGateway {
    provider: Arc<dyn SearchProvider>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl SearchGateway {
    /// Wrap an existing provider.
    pub fn new(provider: Arc<dyn SearchProvider>, config: &GatewayConfig) -> Self {
        Self {
            provider,
            retry: config.retry_policy(),
            timeout: config.timeout(),
        }
    }

    /// Build a gateway backed by the Google Custom Search provider.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the configuration is invalid, or
    /// [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let provider = GoogleCseProvider::new(config)?;
        Ok(Self::new(Arc::new(provider), config))
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the underlying provider can be called at all.
    pub fn has_credentials(&self) -> bool {
        self.provider.has_credentials()
    }

    /// Fetch results for one query.
    ///
    /// Never fails; see the module docs for the degradation path.
    pub async fn fetch(&self, query: &str, options: &SearchOptions) -> FetchOutcome {
        if query.trim().is_empty() {
            tracing::warn!("empty query, serving synthetic results");
            return synthetic(query, options, 0);
        }
        if !self.provider.has_credentials() {
            tracing::debug!(
                provider = self.provider.name(),
                "no provider credentials, serving synthetic results"
            );
            return synthetic(query, options, 0);
        }

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            tracing::debug!(provider = self.provider.name(), attempt, "provider attempt");

            let error = match self.call_once(query, options).await {
                Ok(mut results) => {
                    results.truncate(options.max_results);
                    tracing::debug!(attempt, count = results.len(), "provider returned results");
                    return FetchOutcome {
                        results,
                        origin: ResultOrigin::Provider,
                        attempts: attempt,
                    };
                }
                Err(error) => error,
            };

            match self.retry.delay_after(attempt, &error) {
                Some(delay) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "provider call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    tracing::warn!(
                        attempts = attempt,
                        error = %error,
                        "provider unavailable, serving synthetic results"
                    );
                    return synthetic(query, options, attempt);
                }
            }
        }
    }

    /// Fetch several query variants concurrently and flatten the results
    /// in variant order.
    ///
    /// Synthetic sets are only used when every variant fell back, and
    /// then only the first one, so a partial outage does not dilute real
    /// coverage with placeholders.
    pub async fn fetch_all(&self, queries: &[String], options: &SearchOptions) -> FetchOutcome {
        let outcomes =
            futures::future::join_all(queries.iter().map(|q| self.fetch(q, options))).await;
        let attempts = outcomes.iter().map(|o| o.attempts).sum();

        let real: Vec<RawResult> = outcomes
            .iter()
            .filter(|o| !o.is_synthetic())
            .flat_map(|o| o.results.iter().cloned())
            .collect();

        if outcomes.iter().any(|o| !o.is_synthetic()) {
            return FetchOutcome {
                results: real,
                origin: ResultOrigin::Provider,
                attempts,
            };
        }

        match outcomes.into_iter().next() {
            Some(first) => FetchOutcome {
                attempts,
                ..first
            },
            None => synthetic("", options, 0),
        }
    }

    async fn call_once(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<RawResult>, SearchError> {
        match tokio::time::timeout(self.timeout, self.provider.search(query, options)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(format!(
                "no response within {}s",
                self.timeout.as_secs_f64()
            ))),
        }
    }
}

fn synthetic(query: &str, options: &SearchOptions, attempts: u32) -> FetchOutcome {
    FetchOutcome {
        results: synthetic_results(query, options),
        origin: ResultOrigin::Synthetic,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Provider that replays a script of outcomes, then repeats the last.
    struct ScriptedProvider {
        script: Mutex<Vec<Result<Vec<RawResult>, SearchError>>>,
        calls: AtomicU32,
        credentials: bool,
        delay: Duration,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<Vec<RawResult>, SearchError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
                credentials: true,
                delay: Duration::ZERO,
            }
        }
    }

    fn clone_outcome(
        outcome: &Result<Vec<RawResult>, SearchError>,
    ) -> Result<Vec<RawResult>, SearchError> {
        match outcome {
            Ok(results) => Ok(results.clone()),
            Err(SearchError::RateLimited(m)) => Err(SearchError::RateLimited(m.clone())),
            Err(SearchError::Status { status, message }) => Err(SearchError::Status {
                status: *status,
                message: message.clone(),
            }),
            Err(other) => Err(SearchError::Http(other.to_string())),
        }
    }

    #[async_trait]
    impl SearchProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn has_credentials(&self) -> bool {
            self.credentials
        }

        async fn search(
            &self,
            _query: &str,
            _options: &SearchOptions,
        ) -> Result<Vec<RawResult>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.remove(0)
            } else {
                clone_outcome(&script[0])
            }
        }
    }

    fn fast_config() -> GatewayConfig {
        GatewayConfig {
            retry_base_delay_ms: 1,
            ..Default::default()
        }
    }

    fn gateway(provider: Arc<ScriptedProvider>) -> SearchGateway {
        SearchGateway::new(provider, &fast_config())
    }

    fn ok(n: usize) -> Result<Vec<RawResult>, SearchError> {
        Ok((0..n)
            .map(|i| RawResult::new(format!("T{i}"), "s", format!("https://site{i}.com")))
            .collect())
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok(3)]));
        let outcome = gateway(provider.clone())
            .fetch("acme", &SearchOptions::default())
            .await;
        assert_eq!(outcome.origin, ResultOrigin::Provider);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn results_truncated_to_max() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok(8)]));
        let options = SearchOptions {
            max_results: 5,
            ..Default::default()
        };
        let outcome = gateway(provider).fetch("acme", &options).await;
        assert_eq!(outcome.results.len(), 5);
    }

    #[tokio::test]
    async fn recovers_after_rate_limit() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(SearchError::RateLimited("slow down".into())),
            ok(2),
        ]));
        let outcome = gateway(provider.clone())
            .fetch("acme", &SearchOptions::default())
            .await;
        assert_eq!(outcome.origin, ResultOrigin::Provider);
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn persistent_rate_limit_falls_back_after_budget() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(SearchError::RateLimited(
            "quota".into(),
        ))]));
        let outcome = gateway(provider.clone())
            .fetch("acme", &SearchOptions::default())
            .await;
        assert!(outcome.is_synthetic());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert!((2..=4).contains(&outcome.results.len()));
    }

    #[tokio::test]
    async fn missing_credentials_skip_network() {
        let mut provider = ScriptedProvider::new(vec![ok(3)]);
        provider.credentials = false;
        let provider = Arc::new(provider);
        let outcome = gateway(provider.clone())
            .fetch("acme", &SearchOptions::default())
            .await;
        assert!(outcome.is_synthetic());
        assert_eq!(outcome.attempts, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_query_is_synthetic_without_calls() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok(3)]));
        let outcome = gateway(provider.clone())
            .fetch("   ", &SearchOptions::default())
            .await;
        assert!(outcome.is_synthetic());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn timeout_counts_as_failed_attempt() {
        let mut provider = ScriptedProvider::new(vec![ok(1)]);
        provider.delay = Duration::from_secs(5);
        let provider = Arc::new(provider);
        let outcome = gateway(provider.clone())
            .with_timeout(Duration::from_millis(20))
            .fetch("acme", &SearchOptions::default())
            .await;
        assert!(outcome.is_synthetic());
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn fetch_all_flattens_real_results_in_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![ok(2)]));
        let queries = vec!["a site:x.com".to_owned(), "a site:y.com".to_owned()];
        let outcome = gateway(provider)
            .fetch_all(&queries, &SearchOptions::default())
            .await;
        assert_eq!(outcome.origin, ResultOrigin::Provider);
        assert_eq!(outcome.results.len(), 4);
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn fetch_all_uses_single_synthetic_set_when_all_fall_back() {
        let mut provider = ScriptedProvider::new(vec![ok(2)]);
        provider.credentials = false;
        let queries = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
        let options = SearchOptions::default();
        let outcome = gateway(Arc::new(provider)).fetch_all(&queries, &options).await;
        assert!(outcome.is_synthetic());
        assert_eq!(outcome.results, synthetic_results("a", &options));
    }
}
