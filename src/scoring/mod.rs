//! Per-article and per-scope scoring.

pub mod composite;
pub mod credibility;
pub mod relevance;
pub mod sentiment;

pub use composite::{CompositeScorer, CompositeScores};
pub use credibility::CredibilityScorer;
pub use sentiment::{LexicalSentiment, Sentiment, SentimentClassifier, SentimentLabel};
