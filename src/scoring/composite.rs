//! Composite presence and tonality for one query scope.
//!
//! | sub-score   | formula                                                   | cap |
//! |-------------|-----------------------------------------------------------|-----|
//! | volume      | `ln(n + 1) * 10`                                          | 40  |
//! | authority   | `mean(credibility) * 0.3`                                 | 30  |
//! | diversity   | `(countries * 2 + languages + domains) * 0.5`             | 15  |
//! | recency     | `sum(exp(-days_ago / 7))` over articles from the last 14 days | 15  |
//!
//! `presence = min(100, round(volume + authority + diversity + recency))`.
//!
//! Tonality weighs each labelled article by `credibility / 100`:
//! `round(clamp((P - N) / (P + N + 0.01) * 100, -100, 100))`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::article::ScoredArticle;
use crate::scoring::sentiment::SentimentLabel;

const VOLUME_CAP: f64 = 40.0;
const AUTHORITY_FACTOR: f64 = 0.3;
const DIVERSITY_CAP: f64 = 15.0;
const RECENCY_CAP: f64 = 15.0;
const RECENCY_WINDOW_DAYS: f64 = 14.0;
const RECENCY_DECAY_DAYS: f64 = 7.0;
const TONALITY_EPSILON: f64 = 0.01;

/// Sub-scores for one scope. All zero when there are no articles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeScores {
    pub volume: f64,
    pub authority: f64,
    pub diversity: f64,
    pub recency: f64,
    /// `0..=100`.
    pub presence: u8,
    /// `-100..=100`.
    pub tonality: i32,
}

/// Folds scored articles into [`CompositeScores`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeScorer;

impl CompositeScorer {
    /// Score `articles` as of `now`.
    pub fn score(&self, articles: &[ScoredArticle], now: DateTime<Utc>) -> CompositeScores {
        if articles.is_empty() {
            return CompositeScores::default();
        }

        let volume = volume(articles.len());
        let authority = authority(articles);
        let diversity = diversity(articles);
        let recency = recency(articles, now);
        let presence = (volume + authority + diversity + recency).round().clamp(0.0, 100.0) as u8;

        CompositeScores {
            volume,
            authority,
            diversity,
            recency,
            presence,
            tonality: tonality(articles),
        }
    }
}

fn volume(count: usize) -> f64 {
    ((count as f64 + 1.0).ln() * 10.0).min(VOLUME_CAP)
}

fn authority(articles: &[ScoredArticle]) -> f64 {
    let total: f64 = articles.iter().map(|a| f64::from(a.credibility)).sum();
    total / articles.len() as f64 * AUTHORITY_FACTOR
}

fn diversity(articles: &[ScoredArticle]) -> f64 {
    let countries: HashSet<_> = articles.iter().filter_map(|a| a.country).collect();
    let languages: HashSet<&str> = articles.iter().filter_map(|a| a.language.as_deref()).collect();
    let domains: HashSet<&str> = articles
        .iter()
        .map(|a| a.raw.source_domain.as_str())
        .filter(|d| !d.is_empty())
        .collect();

    let raw = (countries.len() * 2 + languages.len() + domains.len()) as f64 * 0.5;
    raw.min(DIVERSITY_CAP)
}

fn recency(articles: &[ScoredArticle], now: DateTime<Utc>) -> f64 {
    let total: f64 = articles
        .iter()
        .filter_map(|a| a.published_date())
        .map(|published| ((now - published).num_seconds() as f64 / 86_400.0).max(0.0))
        .filter(|days| *days <= RECENCY_WINDOW_DAYS)
        .map(|days| (-days / RECENCY_DECAY_DAYS).exp())
        .sum();
    total.min(RECENCY_CAP)
}

fn tonality(articles: &[ScoredArticle]) -> i32 {
    let weighted = |label: SentimentLabel| -> f64 {
        articles
            .iter()
            .filter(|a| a.sentiment_label == label)
            .map(|a| f64::from(a.credibility) / 100.0)
            .sum()
    };
    let positive = weighted(SentimentLabel::Positive);
    let negative = weighted(SentimentLabel::Negative);

    let ratio = (positive - negative) / (positive + negative + TONALITY_EPSILON) * 100.0;
    ratio.clamp(-100.0, 100.0).round() as i32
}
