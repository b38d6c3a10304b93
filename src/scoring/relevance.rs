//! Query-to-article relevance.
//!
//! `relevance = 70 * term_coverage + 30 / (1 + 0.1 * position)`, clamped
//! to `0..=100`. Term coverage counts a query term fully when it appears
//! in the title and half when it only appears in the snippet. Provider
//! operators (`site:`, exclusions) are not terms.

/// Weight of term coverage.
const TERM_WEIGHT: f64 = 70.0;
/// Weight of provider rank.
const RANK_WEIGHT: f64 = 30.0;
/// Rank decay per position.
const RANK_DECAY: f64 = 0.1;

/// Searchable terms of a query: lowercased, quotes and parentheses
/// removed, operators and single characters dropped, first occurrence kept.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for token in query.split_whitespace() {
        let lower = token.to_lowercase();
        if lower.starts_with("site:") || lower.starts_with('-') {
            continue;
        }
        let term: String = lower
            .chars()
            .filter(|c| !matches!(c, '"' | '(' | ')'))
            .collect();
        let term = term.trim_matches(|c: char| !c.is_alphanumeric()).to_owned();
        if term.chars().count() >= 2 && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// Relevance of an article at 0-based provider `position`.
pub fn relevance(terms: &[String], title: &str, snippet: &str, position: usize) -> u8 {
    let coverage = if terms.is_empty() {
        0.0
    } else {
        let title = title.to_lowercase();
        let snippet = snippet.to_lowercase();
        let matched: f64 = terms
            .iter()
            .map(|term| {
                if title.contains(term.as_str()) {
                    1.0
                } else if snippet.contains(term.as_str()) {
                    0.5
                } else {
                    0.0
                }
            })
            .sum();
        matched / terms.len() as f64
    };

    let rank = RANK_WEIGHT / (1.0 + RANK_DECAY * position as f64);
    (TERM_WEIGHT * coverage + rank).round().clamp(0.0, 100.0) as u8
}
