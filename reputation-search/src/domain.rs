//! Source-domain extraction from result URLs.
//!
//! Credibility lookups and deduplication both key on the publishing
//! domain, so every URL is reduced to a lowercase host with the `www.`
//! prefix and any port removed.

use url::Url;

/// Extract the publishing domain from a result URL.
///
/// Scheme-less inputs (`example.com/path`) are accepted. Returns an
/// empty string if no host can be found.
///
/// # Examples
///
/// ```
/// use reputation_search::domain::source_domain;
///
/// assert_eq!(source_domain("https://WWW.LeMonde.fr/economie/article"), "lemonde.fr");
/// assert_eq!(source_domain("reuters.com/world"), "reuters.com");
/// ```
pub fn source_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let parsed = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("https://{trimmed}"))
    };
    let Ok(parsed) = parsed else {
        return String::new();
    };

    parsed
        .host_str()
        .map(|host| host.trim_start_matches("www.").to_ascii_lowercase())
        .unwrap_or_default()
}

/// Whether `domain` is `known` itself or one of its subdomains.
pub fn is_same_or_subdomain(domain: &str, known: &str) -> bool {
    domain == known || domain.ends_with(&format!(".{known}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_www_and_lowercases() {
        assert_eq!(source_domain("https://www.NYTimes.com/2024/01/x.html"), "nytimes.com");
    }

    #[test]
    fn strips_port() {
        assert_eq!(source_domain("http://example.org:8080/a"), "example.org");
    }

    #[test]
    fn keeps_subdomains_other_than_www() {
        assert_eq!(source_domain("https://blog.example.com/post"), "blog.example.com");
    }

    #[test]
    fn scheme_less_input_accepted() {
        assert_eq!(source_domain("lesechos.fr/tech"), "lesechos.fr");
    }

    #[test]
    fn garbage_yields_empty() {
        assert_eq!(source_domain(""), "");
        assert_eq!(source_domain("   "), "");
        assert_eq!(source_domain("http://"), "");
    }

    #[test]
    fn subdomain_matching() {
        assert!(is_same_or_subdomain("lemonde.fr", "lemonde.fr"));
        assert!(is_same_or_subdomain("blog.lemonde.fr", "lemonde.fr"));
        assert!(!is_same_or_subdomain("notlemonde.fr", "lemonde.fr"));
    }
}
