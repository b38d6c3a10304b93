//! Heuristic sentiment classifier for press coverage.
//!
//! Scans the case-folded title and snippet of an article against two
//! fixed keyword lists (English and French) and derives a signed score
//! from the hit counts:
//!
//! `score = (positive - negative) / (positive + negative) * 100`
//!
//! Scores above [`POSITIVE_THRESHOLD`] are `positive`, below
//! [`NEGATIVE_THRESHOLD`] `negative`, anything else `neutral`. The
//! classifier sits behind the [`SentimentClassifier`] trait so a
//! model-based implementation can replace it without touching the
//! composite scorer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores strictly above this are `positive`.
pub const POSITIVE_THRESHOLD: i32 = 20;
/// Scores strictly below this are `negative`.
pub const NEGATIVE_THRESHOLD: i32 = -20;

/// Coarse sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Label for a signed score in `-100..=100`.
    pub fn from_score(score: i32) -> Self {
        if score > POSITIVE_THRESHOLD {
            Self::Positive
        } else if score < NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentiment {
    /// Coarse label derived from `score`.
    pub label: SentimentLabel,
    /// Signed score in `-100..=100`.
    pub score: i32,
}

impl Sentiment {
    /// The no-signal result.
    pub const NEUTRAL: Self = Self {
        label: SentimentLabel::Neutral,
        score: 0,
    };
}

/// Anything that can grade the tone of a piece of text.
pub trait SentimentClassifier: Send + Sync {
    /// Classify `text`. Must return a score within `-100..=100`.
    fn classify(&self, text: &str) -> Sentiment;
}

// ── Keyword tables ──────────────────────────────────────────────────────

const POSITIVE_KEYWORDS: &[&str] = &[
    // en
    "award",
    "growth",
    "success",
    "innovative",
    "innovation",
    "praised",
    "breakthrough",
    "expansion",
    "partnership",
    "record profit",
    "strong results",
    "outperform",
    "celebrated",
    "acclaimed",
    "trusted",
    "milestone",
    "wins",
    "recommended",
    "thriving",
    "upgrade",
    // fr
    "succès",
    "croissance",
    "récompens",
    "innovant",
    "partenariat",
    "salué",
    "hausse",
    "réussite",
    "primé",
    "bénéfice record",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    // en
    "scandal",
    "lawsuit",
    "fraud",
    "layoff",
    "bankrupt",
    "investigation",
    "fined",
    "recall",
    "controversy",
    "boycott",
    "losses",
    "decline",
    "crisis",
    "complaint",
    "accused",
    "data breach",
    "probe",
    "plunge",
    "criticised",
    "criticized",
    // fr
    "scandale",
    "procès",
    "fraude",
    "licenciement",
    "faillite",
    "enquête",
    "amende",
    "polémique",
    "plainte",
    "accusé",
    "crise",
    "baisse",
    "pertes",
];

/// Keyword-list classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSentiment;

impl LexicalSentiment {
    /// Positive and negative keyword hits in `text`.
    ///
    /// Every occurrence counts. A keyword matches at word starts only, so
    /// "recall" hits "recalled" but "wins" never hits "twins".
    pub fn hits(&self, text: &str) -> (usize, usize) {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        (
            occurrences(&words, POSITIVE_KEYWORDS),
            occurrences(&words, NEGATIVE_KEYWORDS),
        )
    }
}

fn occurrences(words: &[&str], keywords: &[&str]) -> usize {
    (0..words.len())
        .map(|start| {
            keywords
                .iter()
                .filter(|kw| matches_at(&words[start..], kw))
                .count()
        })
        .sum()
}

/// Whether the words starting at `words[0]` begin with every word of `keyword`.
fn matches_at(words: &[&str], keyword: &str) -> bool {
    let parts: Vec<&str> = keyword.split_whitespace().collect();
    parts.len() <= words.len()
        && parts
            .iter()
            .zip(words)
            .all(|(part, word)| word.starts_with(*part))
}

impl SentimentClassifier for LexicalSentiment {
    fn classify(&self, text: &str) -> Sentiment {
        let (positive, negative) = self.hits(text);
        let total = positive + negative;
        if total == 0 {
            return Sentiment::NEUTRAL;
        }

        let ratio = (positive as f64 - negative as f64) / total as f64;
        let score = (ratio * 100.0).round().clamp(-100.0, 100.0) as i32;
        Sentiment {
            label: SentimentLabel::from_score(score),
            score,
        }
    }
}
