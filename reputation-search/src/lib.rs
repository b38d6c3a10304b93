//! # reputation-search
//!
//! Search side of the reputation pipeline: turns a user query into
//! provider queries, fetches results resiliently, caches them and
//! collapses duplicates.
//!
//! ## Design
//!
//! - [`QueryBuilder`] sanitises input and scopes it to a [`Country`]
//! - [`SearchGateway`] calls a [`SearchProvider`] under a deadline,
//!   retries per [`RetryPolicy`] and degrades to synthetic results
//! - [`ResultCache`] is an explicitly constructed TTL cache with
//!   single-flight get-or-compute
//! - [`deduplicate`] keeps the first of each (title, domain, date)
//!
//! ## Security
//!
//! - The provider API key is redacted from `Debug` output and stripped
//!   from transport errors
//! - Search queries are logged only at trace level

pub mod cache;
pub mod config;
pub mod country;
pub mod dedup;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod http;
pub mod provider;
pub mod providers;
pub mod query;
pub mod retry;
pub mod types;

pub use cache::{CacheKey, CacheStats, ResultCache};
pub use config::GatewayConfig;
pub use country::Country;
pub use dedup::deduplicate;
pub use error::{Result, SearchError};
pub use gateway::SearchGateway;
pub use provider::SearchProvider;
pub use query::QueryBuilder;
pub use retry::RetryPolicy;
pub use types::{FetchOutcome, RawResult, ResultOrigin, SearchKind, SearchOptions};

/// Build provider queries for `raw` and fetch them through `gateway`.
///
/// Press searches fan out to several outlet-restricted variants that run
/// concurrently. An unusable query yields the synthetic set without
/// touching the network.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> reputation_search::Result<()> {
/// use reputation_search::{search, Country, GatewayConfig, QueryBuilder, SearchGateway};
/// use reputation_search::{SearchKind, SearchOptions};
///
/// let gateway = SearchGateway::from_config(&GatewayConfig::default())?;
/// let options = SearchOptions::for_country(Country::France, 10);
/// let outcome = search(&gateway, &QueryBuilder::default(), "Acme", &options, SearchKind::Press).await;
/// for result in &outcome.results {
///     println!("{}: {}", result.source_domain, result.title);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(
    gateway: &SearchGateway,
    builder: &QueryBuilder,
    raw: &str,
    options: &SearchOptions,
    kind: SearchKind,
) -> FetchOutcome {
    let queries = builder.build(raw, options.country, kind);
    if queries.is_empty() {
        tracing::debug!("query sanitised to nothing");
        return gateway.fetch("", options).await;
    }
    gateway.fetch_all(&queries, options).await
}
