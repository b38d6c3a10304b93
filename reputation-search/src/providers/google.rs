//! Google Custom Search JSON API client.
//!
//! One GET per query against `{base_url}?key=..&cx=..&q=..`, with the
//! country and language hints mapped onto the `gl`, `lr` and `hl`
//! parameters. Publication dates are recovered from page metadata when
//! the page exposes it, otherwise from the date prefix Google puts in
//! front of news snippets (`"3 days ago ... "`, `"Mar 14, 2024 ... "`).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Deserialize;
use url::Url;

use crate::config::GatewayConfig;
use crate::error::SearchError;
use crate::http::build_client;
use crate::provider::SearchProvider;
use crate::types::{RawResult, SearchOptions};

/// Largest page the API serves per request.
const MAX_PAGE_SIZE: usize = 10;

/// Metatag keys that carry an article's publication time.
const PUBLISHED_KEYS: &[&str] = &[
    "article:published_time",
    "og:article:published_time",
    "datepublished",
];

/// Google Custom Search provider.
pub struct GoogleCseProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    engine_id: Option<String>,
}

impl GoogleCseProvider {
    /// Build a provider from gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            engine_id: config.engine_id.clone().filter(|c| !c.trim().is_empty()),
        })
    }

    fn request_url(
        &self,
        api_key: &str,
        engine_id: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Url, SearchError> {
        let num = options.max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params: Vec<(&str, String)> = vec![
            ("key", api_key.to_owned()),
            ("cx", engine_id.to_owned()),
            ("q", query.to_owned()),
            ("num", num),
        ];
        if let Some(country) = options.country {
            params.push(("gl", country.geo_code().to_owned()));
        }
        if let Some(language) = options.language.as_deref() {
            params.push(("lr", format!("lang_{language}")));
            params.push(("hl", language.to_owned()));
        }

        Url::parse_with_params(&self.base_url, &params)
            .map_err(|e| SearchError::Config(format!("invalid provider base_url: {e}")))
    }
}

#[async_trait]
impl SearchProvider for GoogleCseProvider {
    fn name(&self) -> &'static str {
        "google-cse"
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some() && self.engine_id.is_some()
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<RawResult>, SearchError> {
        let (Some(api_key), Some(engine_id)) = (self.api_key.as_deref(), self.engine_id.as_deref())
        else {
            return Err(SearchError::MissingCredentials);
        };

        let url = self.request_url(api_key, engine_id, query, options)?;
        tracing::trace!(query, "google-cse request");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(map_http_error(status, &body));
        }

        parse_response(&body, Utc::now())
    }
}

/// Map a non-success provider response onto the error taxonomy.
fn map_http_error(status: reqwest::StatusCode, body: &str) -> SearchError {
    let message = extract_error_message(body);
    match status.as_u16() {
        429 => SearchError::RateLimited(message),
        code => SearchError::Status {
            status: code,
            message,
        },
    }
}

/// Extract the error message from an API error body, truncated for logs.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
        .chars()
        .take(200)
        .collect()
}

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    pagemap: Option<PageMap>,
}

#[derive(Debug, Deserialize)]
struct PageMap {
    #[serde(default)]
    metatags: Vec<HashMap<String, serde_json::Value>>,
}

/// Decode a successful response body into results.
///
/// A body without `items` is a valid empty result set. Items without a
/// link are skipped.
fn parse_response(body: &str, now: DateTime<Utc>) -> Result<Vec<RawResult>, SearchError> {
    let response: CseResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::Parse(format!("invalid provider response: {e}")))?;

    Ok(response
        .items
        .into_iter()
        .filter(|item| !item.link.trim().is_empty())
        .map(|item| {
            let published = item
                .pagemap
                .as_ref()
                .and_then(metatag_date)
                .or_else(|| snippet_date(&item.snippet, now));
            let result = RawResult::new(item.title.trim(), item.snippet.trim(), item.link.trim());
            match published {
                Some(published) => result.with_published(published),
                None => result,
            }
        })
        .collect())
}

fn metatag_date(pagemap: &PageMap) -> Option<DateTime<Utc>> {
    pagemap
        .metatags
        .iter()
        .flat_map(|tags| PUBLISHED_KEYS.iter().filter_map(|key| tags.get(*key)))
        .filter_map(|value| value.as_str())
        .find_map(parse_timestamp)
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

/// Recover a date from the prefix Google puts in front of dated snippets.
fn snippet_date(snippet: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let head = snippet.split("...").next()?.split('…').next()?.trim();
    if head.is_empty() || head.chars().count() > 20 {
        return None;
    }

    if let Some(relative) = head.strip_suffix("ago") {
        let mut parts = relative.split_whitespace();
        let amount: i64 = parts.next()?.parse().ok()?;
        let delta = match parts.next()?.trim_end_matches('s') {
            "min" | "minute" => TimeDelta::try_minutes(amount)?,
            "hour" => TimeDelta::try_hours(amount)?,
            "day" => TimeDelta::try_days(amount)?,
            "week" => TimeDelta::try_weeks(amount)?,
            _ => return None,
        };
        return now.checked_sub_signed(delta);
    }

    NaiveDate::parse_from_str(head, "%b %d, %Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::Country;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
    }

    fn provider() -> GoogleCseProvider {
        let config = GatewayConfig {
            api_key: Some("k".into()),
            engine_id: Some("cx".into()),
            base_url: "https://search.test/customsearch/v1".into(),
            ..Default::default()
        };
        GoogleCseProvider::new(&config).unwrap()
    }

    #[test]
    fn request_url_carries_scope_parameters() {
        let options = SearchOptions::for_country(Country::UnitedKingdom, 25);
        let url = provider()
            .request_url("k", "cx", "\"Acme Corp\" UK", &options)
            .unwrap();
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["q"], "\"Acme Corp\" UK");
        assert_eq!(params["num"], "10");
        assert_eq!(params["gl"], "uk");
        assert_eq!(params["lr"], "lang_en");
        assert_eq!(params["key"], "k");
        assert_eq!(params["cx"], "cx");
    }

    #[test]
    fn request_url_without_scope_omits_geo() {
        let url = provider()
            .request_url("k", "cx", "acme", &SearchOptions::default())
            .unwrap();
        assert!(!url.query_pairs().any(|(k, _)| k == "gl" || k == "lr"));
    }

    #[test]
    fn blank_credentials_are_missing() {
        let config = GatewayConfig {
            api_key: Some(" ".into()),
            engine_id: Some("cx".into()),
            ..Default::default()
        };
        assert!(!GoogleCseProvider::new(&config).unwrap().has_credentials());
        assert!(provider().has_credentials());
    }

    #[tokio::test]
    async fn search_without_credentials_fails_fast() {
        let provider = GoogleCseProvider::new(&GatewayConfig::default()).unwrap();
        let err = provider
            .search("acme", &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::MissingCredentials));
    }

    #[test]
    fn parses_items_and_metatag_dates() {
        let body = r#"{
            "items": [
                {
                    "title": " Acme wins award ",
                    "link": "https://www.lemonde.fr/acme",
                    "snippet": "Acme was recognised...",
                    "pagemap": {"metatags": [{"article:published_time": "2024-03-18T08:30:00+01:00"}]}
                },
                {"title": "No link", "link": "", "snippet": "x"},
                {"title": "Plain", "link": "https://example.com/p", "snippet": "plain text"}
            ]
        }"#;
        let results = parse_response(body, now()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Acme wins award");
        assert_eq!(results[0].source_domain, "lemonde.fr");
        assert_eq!(
            results[0].published,
            Some(Utc.with_ymd_and_hms(2024, 3, 18, 7, 30, 0).unwrap())
        );
        assert!(results[1].published.is_none());
    }

    #[test]
    fn missing_items_is_empty() {
        let results = parse_response(r#"{"kind": "customsearch#search"}"#, now()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let err = parse_response("<html>", now()).unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }

    #[test]
    fn snippet_relative_dates() {
        assert_eq!(
            snippet_date("3 days ago ... Acme said", now()),
            Some(now() - TimeDelta::days(3))
        );
        assert_eq!(
            snippet_date("5 hours ago … Acme", now()),
            Some(now() - TimeDelta::hours(5))
        );
        assert_eq!(
            snippet_date("1 week ago ... x", now()),
            Some(now() - TimeDelta::weeks(1))
        );
    }

    #[test]
    fn snippet_absolute_date() {
        assert_eq!(
            snippet_date("Mar 14, 2024 ... Acme", now()),
            Some(Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn snippet_without_date() {
        assert!(snippet_date("Acme is a company that makes things", now()).is_none());
        assert!(snippet_date("many years ago ... x", now()).is_none());
        assert!(snippet_date("", now()).is_none());
    }

    #[test]
    fn rate_limit_maps_to_rate_limited() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded"}}"#;
        let err = map_http_error(reqwest::StatusCode::TOO_MANY_REQUESTS, body);
        assert!(err.is_rate_limited());
        assert!(err.to_string().contains("Quota exceeded"));
    }

    #[test]
    fn other_status_maps_to_status() {
        let err = map_http_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        match err {
            SearchError::Status { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
