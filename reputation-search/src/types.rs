//! Core types for search requests and raw provider results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::country::Country;
use crate::domain::source_domain;

/// A single article returned by the search provider (or synthesised by
/// the fallback). Never modified after the gateway returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResult {
    /// Article headline.
    pub title: String,
    /// Provider snippet summarising the page.
    pub snippet: String,
    /// Canonical article URL.
    pub url: String,
    /// Publishing domain derived from `url` (lowercase, no `www.`).
    pub source_domain: String,
    /// Publication time, when the provider exposes one.
    #[serde(default, rename = "publishedDate", skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
}

impl RawResult {
    /// Build a result, deriving `source_domain` from the URL.
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let url = url.into();
        Self {
            title: title.into(),
            snippet: snippet.into(),
            source_domain: source_domain(&url),
            url,
            published: None,
        }
    }

    /// Attach a publication timestamp.
    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }
}

/// Which family of queries a fetch belongs to. Part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    /// General web coverage for a country.
    #[default]
    Web,
    /// Coverage restricted to a country's national press outlets.
    Press,
}

impl SearchKind {
    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Press => "press",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scope of a single provider fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchOptions {
    /// Country to geo-target, if any.
    pub country: Option<Country>,
    /// Interface/result language (ISO 639-1), if any.
    pub language: Option<String>,
    /// Number of results to request from the provider.
    pub max_results: usize,
}

impl SearchOptions {
    /// Options scoped to a country and its primary language.
    pub fn for_country(country: Country, max_results: usize) -> Self {
        Self {
            country: Some(country),
            language: Some(country.language().to_owned()),
            max_results,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            country: None,
            language: None,
            max_results: 10,
        }
    }
}

/// Where the results of a fetch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrigin {
    /// Real provider response.
    Provider,
    /// Deterministic placeholder data.
    Synthetic,
}

/// Results of a gateway fetch plus how they were obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    /// Returned articles, in provider rank order.
    pub results: Vec<RawResult>,
    /// Whether the provider or the fallback produced them.
    pub origin: ResultOrigin,
    /// Provider attempts made (0 when credentials were missing).
    pub attempts: u32,
}

impl FetchOutcome {
    /// Whether the results are synthetic placeholders.
    pub fn is_synthetic(&self) -> bool {
        self.origin == ResultOrigin::Synthetic
    }
}
