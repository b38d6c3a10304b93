//! Per-article scoring.
//!
//! [`ArticleScorer`] turns deduplicated [`RawResult`]s into
//! [`ScoredArticle`]s: credibility from the source domain, sentiment from
//! title + snippet, relevance from query terms and provider rank, and the
//! country/language the article counts towards for diversity.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reputation_search::{Country, RawResult, SearchOptions};
use serde::{Deserialize, Serialize};

use crate::scoring::credibility::CredibilityScorer;
use crate::scoring::relevance::{query_terms, relevance};
use crate::scoring::sentiment::{LexicalSentiment, SentimentClassifier, SentimentLabel};

/// A result with its per-article scores. Never mutated after scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub raw: RawResult,
    /// Source credibility in `30..=100`.
    pub credibility: u8,
    pub sentiment_label: SentimentLabel,
    /// Signed sentiment in `-100..=100`.
    pub sentiment_score: i32,
    /// Query relevance in `0..=100`.
    pub relevance: u8,
    /// Country the article is attributed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
    /// Language the article is attributed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ScoredArticle {
    /// Publication time, if known.
    pub fn published_date(&self) -> Option<DateTime<Utc>> {
        self.raw.published
    }
}

/// Scores raw results for one query scope.
#[derive(Clone)]
pub struct ArticleScorer {
    credibility: CredibilityScorer,
    sentiment: Arc<dyn SentimentClassifier>,
}

impl Default for ArticleScorer {
    fn default() -> Self {
        Self::new(Arc::new(LexicalSentiment))
    }
}

impl ArticleScorer {
    /// Scorer using the given sentiment classifier.
    pub fn new(sentiment: Arc<dyn SentimentClassifier>) -> Self {
        Self {
            credibility: CredibilityScorer,
            sentiment,
        }
    }

    /// Score `results` (in provider rank order) for `query` within `scope`.
    ///
    /// Articles are attributed to the country their domain belongs to,
    /// falling back to the scope's country; language follows the
    /// attributed country, falling back to the scope's language.
    pub fn score_all(
        &self,
        query: &str,
        results: Vec<RawResult>,
        scope: &SearchOptions,
    ) -> Vec<ScoredArticle> {
        let terms = query_terms(query);
        results
            .into_iter()
            .enumerate()
            .map(|(position, raw)| {
                let credibility = self.credibility.score(&raw.source_domain);
                let sentiment = self
                    .sentiment
                    .classify(&format!("{} {}", raw.title, raw.snippet));
                let relevance = relevance(&terms, &raw.title, &raw.snippet, position);
                let country = Country::from_domain(&raw.source_domain).or(scope.country);
                let language = country
                    .map(|c| c.language().to_owned())
                    .or_else(|| scope.language.clone());

                ScoredArticle {
                    raw,
                    credibility,
                    sentiment_label: sentiment.label,
                    sentiment_score: sentiment.score.clamp(-100, 100),
                    relevance,
                    country,
                    language,
                }
            })
            .collect()
    }
}
