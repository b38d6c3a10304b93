//! Query sanitisation and geography-scoped query composition.
//!
//! User text is reduced to a provider-safe character set while keeping
//! the operators the provider understands (quoted phrases, parentheses,
//! `site:` restrictions). Sanitisation is idempotent: running it on its
//! own output returns the same string.

use crate::country::Country;
use crate::types::SearchKind;

/// Maximum query length, in characters, sent to the provider.
pub const MAX_QUERY_CHARS: usize = 200;

/// Minimum length of a usable sanitised query.
const MIN_QUERY_CHARS: usize = 2;

/// Punctuation kept by the sanitiser in addition to letters, digits and spaces.
const ALLOWED_PUNCTUATION: &[char] = &['-', '.', '\'', '"', ':', '(', ')'];

/// Builds provider queries from raw user input.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    /// Length cap applied after sanitisation.
    pub max_chars: usize,
    /// How many press outlets a press query fans out to.
    pub press_variants: usize,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            max_chars: MAX_QUERY_CHARS,
            press_variants: 3,
        }
    }
}

impl QueryBuilder {
    /// Sanitise raw user input.
    ///
    /// Returns an empty string when nothing usable (fewer than two
    /// characters) survives.
    pub fn sanitize(&self, raw: &str) -> String {
        let filtered: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(c))
            .collect();

        let repaired = repair_until_stable(&filtered);
        // A hard cut can split a `site:` token, so repair the cut text too.
        let truncated = repair_until_stable(&truncate_on_word_boundary(&repaired, self.max_chars));

        if truncated.chars().count() < MIN_QUERY_CHARS {
            String::new()
        } else {
            truncated
        }
    }

    /// Compose the provider queries for one country scope.
    ///
    /// Web queries get a single query with the country's market terms
    /// appended. Press queries get one `site:`-restricted variant per
    /// national outlet (up to `press_variants`). Every returned query is
    /// at most `max_chars` long. Returns an empty list when the input is
    /// unusable.
    pub fn build(&self, raw: &str, country: Option<Country>, kind: SearchKind) -> Vec<String> {
        let sanitized = self.sanitize(raw);
        if sanitized.is_empty() {
            return Vec::new();
        }
        let phrase = phrase_of(&sanitized);

        match (kind, country) {
            (SearchKind::Web, None) | (SearchKind::Press, None) => {
                vec![fit(&phrase, self.max_chars)]
            }
            (SearchKind::Web, Some(country)) => {
                let lower = sanitized.to_lowercase();
                let terms: Vec<&str> = country
                    .market_terms()
                    .iter()
                    .copied()
                    .filter(|term| !lower.contains(&term.to_lowercase()))
                    .collect();
                if terms.is_empty() {
                    vec![fit(&phrase, self.max_chars)]
                } else {
                    vec![self.with_suffix(&phrase, &terms.join(" "))]
                }
            }
            (SearchKind::Press, Some(country)) => country
                .press_domains()
                .iter()
                .take(self.press_variants.max(1))
                .map(|domain| self.with_suffix(&phrase, &format!("site:{domain}")))
                .collect(),
        }
    }

    /// Append `suffix`, shortening `phrase` so the whole fits `max_chars`.
    fn with_suffix(&self, phrase: &str, suffix: &str) -> String {
        let budget = self
            .max_chars
            .saturating_sub(suffix.chars().count() + 1);
        let head = fit(phrase, budget);
        if head.is_empty() {
            truncate_on_word_boundary(suffix, self.max_chars)
        } else {
            format!("{head} {suffix}")
        }
    }
}

/// Quote multi-word input as an exact phrase unless the user already
/// used operators.
fn phrase_of(sanitized: &str) -> String {
    if sanitized.contains('"') || sanitized.contains("site:") || !sanitized.contains(' ') {
        sanitized.to_owned()
    } else {
        format!("\"{sanitized}\"")
    }
}

/// Shorten `phrase` to `budget` characters, closing any quote the cut
/// leaves dangling.
fn fit(phrase: &str, budget: usize) -> String {
    if phrase.chars().count() <= budget {
        return phrase.to_owned();
    }
    balance_quotes(&truncate_on_word_boundary(phrase, budget.saturating_sub(1)))
}

/// Close a quote left dangling by truncation.
fn balance_quotes(text: &str) -> String {
    if text.matches('"').count() % 2 == 1 {
        format!("{text}\"")
    } else {
        text.to_owned()
    }
}

/// Rejoin `site : domain` into `site:domain` and drop `site:` operators
/// that have no domain to restrict to.
/// Repeat [`repair_site_operators`] until a pass changes nothing.
///
/// Each changing pass drops or merges tokens, so this terminates.
fn repair_until_stable(text: &str) -> String {
    let mut current = text.split_whitespace().collect::<Vec<_>>().join(" ");
    loop {
        let tokens: Vec<&str> = current.split_whitespace().collect();
        let next = repair_site_operators(&tokens).join(" ");
        if next == current {
            return current;
        }
        current = next;
    }
}

fn repair_site_operators(tokens: &[&str]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        let lower = token.to_lowercase();
        let next = tokens.get(i + 1).copied();

        if lower == "site" && next == Some(":") {
            // `site : domain` or an orphaned `site :`
            match tokens.get(i + 2) {
                Some(domain) if is_domain(domain) => {
                    out.push(format!("site:{domain}"));
                    i += 3;
                }
                _ => i += 2,
            }
        } else if let Some(candidate) = next
            .filter(|_| lower == "site")
            .and_then(|t| t.strip_prefix(':'))
        {
            // `site :domain`
            if is_domain(candidate) {
                out.push(format!("site:{candidate}"));
            }
            i += 2;
        } else if lower == "site:" {
            // `site: domain`
            match next {
                Some(domain) if is_domain(domain) => {
                    out.push(format!("site:{domain}"));
                    i += 2;
                }
                _ => i += 1,
            }
        } else if lower.starts_with("site:") {
            let candidate = token.get(5..).unwrap_or_default();
            if is_domain(candidate) {
                out.push(format!("site:{candidate}"));
            }
            i += 1;
        } else {
            out.push(token.to_owned());
            i += 1;
        }
    }

    out
}

/// Loose hostname check: dotted labels of letters, digits and hyphens.
fn is_domain(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.contains('.')
        && !candidate.starts_with('.')
        && !candidate.ends_with('.')
        && !candidate.contains("..")
        && candidate
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '.')
}

/// Cut `text` to at most `max_chars` characters, backing off to the last
/// space so no word is split. Falls back to a hard cut for a single
/// overlong word.
fn truncate_on_word_boundary(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let mut cut: String = text.chars().take(max_chars).collect();
    let next_is_space = text.chars().nth(max_chars) == Some(' ');
    if !next_is_space {
        if let Some(pos) = cut.rfind(' ') {
            cut.truncate(pos);
        }
    }
    cut.trim_end().to_owned()
}
