//! Trait definition for pluggable search providers.
//!
//! The gateway only talks to a provider through [`SearchProvider`], so
//! tests and alternative backends can be swapped in without touching
//! retry or fallback logic.

use async_trait::async_trait;

use crate::error::SearchError;
use crate::types::{RawResult, SearchOptions};

/// A search backend reachable over the network.
///
/// Implementations perform exactly one request per [`search`] call and
/// classify failures through [`SearchError`]:
///
/// - HTTP 429 must map to [`SearchError::RateLimited`]
/// - other non-success statuses to [`SearchError::Status`]
/// - absent credentials to [`SearchError::MissingCredentials`]
///
/// Retrying, deadlines and fallback are the gateway's job.
///
/// [`search`]: SearchProvider::search
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the provider is configured well enough to be called.
    fn has_credentials(&self) -> bool;

    /// Run one query and return results in provider rank order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the request fails, the provider rejects
    /// it, or the response cannot be decoded.
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<RawResult>, SearchError>;
}
