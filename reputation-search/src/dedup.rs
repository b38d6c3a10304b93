//! Near-duplicate collapsing.
//!
//! Two results are duplicates when they share a normalised title, a
//! source domain and a publication date. Syndicated copies of the same
//! story on different outlets are kept: each outlet counts towards
//! coverage.

use std::collections::HashSet;

use crate::types::RawResult;

/// Identity of a result for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    title: String,
    domain: String,
    date: String,
}

impl DedupKey {
    /// Key for `result`. Undated results use an empty date component.
    pub fn of(result: &RawResult) -> Self {
        Self {
            title: normalize_title(&result.title),
            domain: result.source_domain.clone(),
            date: result
                .published
                .map(|p| p.date_naive().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Lowercase, drop punctuation and collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep the first result per [`DedupKey`], preserving input order.
///
/// Idempotent: deduplicating an already-deduplicated list returns it
/// unchanged.
pub fn deduplicate(results: Vec<RawResult>) -> Vec<RawResult> {
    let mut seen: HashSet<DedupKey> = HashSet::with_capacity(results.len());
    results
        .into_iter()
        .filter(|result| seen.insert(DedupKey::of(result)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn result(title: &str, url: &str) -> RawResult {
        RawResult::new(title, "snippet", url)
    }

    #[test]
    fn normalises_titles() {
        assert_eq!(normalize_title("  Acme, Inc. - Wins BIG!  "), "acme inc wins big");
        assert_eq!(normalize_title("L'Oréal   rachète"), "loréal rachète");
    }

    #[test]
    fn drops_same_title_same_domain() {
        let results = vec![
            result("Acme wins award", "https://lemonde.fr/a"),
            result("ACME wins award!", "https://www.lemonde.fr/b"),
        ];
        let deduped = deduplicate(results);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].url, "https://lemonde.fr/a");
    }

    #[test]
    fn keeps_same_title_on_other_outlets() {
        let results = vec![
            result("Acme wins award", "https://lemonde.fr/a"),
            result("Acme wins award", "https://lefigaro.fr/a"),
        ];
        assert_eq!(deduplicate(results).len(), 2);
    }

    #[test]
    fn different_dates_are_distinct() {
        let monday = Utc.with_ymd_and_hms(2024, 3, 18, 9, 0, 0).unwrap();
        let tuesday = Utc.with_ymd_and_hms(2024, 3, 19, 9, 0, 0).unwrap();
        let results = vec![
            result("Acme update", "https://lemonde.fr/a").with_published(monday),
            result("Acme update", "https://lemonde.fr/b").with_published(tuesday),
            result("Acme update", "https://lemonde.fr/c").with_published(monday),
        ];
        let deduped = deduplicate(results);
        assert_eq!(deduped.len(), 2);
        assert!(deduped[0].url.ends_with("/a"));
        assert!(deduped[1].url.ends_with("/b"));
    }

    #[test]
    fn preserves_input_order() {
        let results = vec![
            result("C", "https://c.com"),
            result("A", "https://a.com"),
            result("B", "https://b.com"),
        ];
        let titles: Vec<String> = deduplicate(results).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
    }

    #[test]
    fn deduplication_is_idempotent() {
        let results = vec![
            result("Acme", "https://a.com/1"),
            result("acme", "https://a.com/2"),
            result("Other", "https://a.com/3"),
            result("Acme", "https://b.com/1"),
        ];
        let once = deduplicate(results);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input() {
        assert!(deduplicate(Vec::new()).is_empty());
    }
}
