//! Reputation: country-scoped reputation analysis of a name or brand.
//!
//! For each requested country a query is searched (through a shared
//! cache), the returned articles are deduplicated and scored, and the
//! per-article scores are folded into presence and tonality scores. The
//! countries are then ranked into a global report.
//!
//! # Architecture
//!
//! - **Search** ([`reputation_search`]): query building, resilient provider
//!   access with synthetic fallback, TTL caching, deduplication
//! - **Scoring** ([`scoring`], [`article`]): credibility, sentiment and
//!   relevance per article; presence and tonality per country
//! - **Analysis** ([`analysis`]): optional language-model scores with a
//!   neutral fallback
//! - **Pipeline** ([`pipeline`], [`aggregator`]): one task per country,
//!   ranked into a [`GlobalReport`]
//! - **Server** ([`server`]): `POST /reputation`, `POST /press-reputation`

pub mod aggregator;
pub mod analysis;
pub mod article;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod scoring;
pub mod server;

pub use aggregator::{CountryAggregator, CountryRanking, GlobalReport};
pub use analysis::{Analysis, AnalysisCollaborator, AnalysisRequest};
pub use article::{ArticleScorer, ScoredArticle};
pub use config::ReputationConfig;
pub use error::{ReputationError, Result};
pub use pipeline::{CountryScore, Pipeline};
