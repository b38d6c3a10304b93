//! Headline analysis from an external language-model collaborator.
//!
//! The collaborator sees the query plus a handful of article snippets and
//! answers with three bounded scores and a short rationale. Anything that
//! goes wrong on the way (no endpoint configured, transport error,
//! non-2xx status, unparsable reply) degrades to [`Analysis::neutral`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AnalysisConfig;
use crate::error::{ReputationError, Result};

/// Neutral score used for every field of the fallback analysis.
pub const NEUTRAL_SCORE: u8 = 50;
/// Rationale of the fallback analysis.
pub const UNAVAILABLE_RATIONALE: &str = "not available";

const SYSTEM_PROMPT: &str = "You assess the public reputation of a name or brand from press \
snippets. Reply with a single JSON object and nothing else: \
{\"presence_score\": 0-100, \"tone_score\": 0-100, \"coherence_score\": 0-100, \
\"rationale\": \"two sentences\"}. Write the rationale in the requested language.";

/// Input for one analysis call.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub query: String,
    /// Article titles and snippets, most relevant first.
    pub context_snippets: Vec<String>,
    /// ISO 639-1 code the rationale should be written in.
    pub target_language: String,
}

/// Collaborator scores, each in `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub presence_score: u8,
    pub tone_score: u8,
    pub coherence_score: u8,
    pub rationale: String,
    /// `false` when this is the neutral fallback.
    pub available: bool,
}

impl Analysis {
    /// Fixed fallback: every score 50, rationale "not available".
    pub fn neutral() -> Self {
        Self {
            presence_score: NEUTRAL_SCORE,
            tone_score: NEUTRAL_SCORE,
            coherence_score: NEUTRAL_SCORE,
            rationale: UNAVAILABLE_RATIONALE.to_owned(),
            available: false,
        }
    }
}

/// Something that can score a query against context snippets.
#[async_trait]
pub trait AnalysisCollaborator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Analyse one request.
    ///
    /// # Errors
    ///
    /// Returns [`ReputationError::Analysis`] on transport, status or parse
    /// failures. Callers normally go through [`analyze_or_neutral`].
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Analysis>;
}

/// Collaborator used when no endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnalysis;

#[async_trait]
impl AnalysisCollaborator for NoAnalysis {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<Analysis> {
        Ok(Analysis::neutral())
    }
}

/// OpenAI-compatible chat-completions client.
pub struct ChatCompletionAnalyst {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_snippets: usize,
}

impl ChatCompletionAnalyst {
    /// Client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ReputationError::Analysis`] if the HTTP client cannot be
    /// built.
    pub fn new(base_url: &str, config: &AnalysisConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReputationError::Analysis(format!("failed to build HTTP client: {e}")))?;

        let base = base_url.trim_end_matches('/');
        let endpoint = if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        };

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_snippets: config.max_snippets,
        })
    }

    fn request_body(&self, request: &AnalysisRequest) -> Value {
        let snippets: Vec<String> = request
            .context_snippets
            .iter()
            .take(self.max_snippets)
            .map(|s| format!("- {s}"))
            .collect();
        let user = format!(
            "Subject: {}\nLanguage: {}\nSnippets:\n{}",
            request.query,
            request.target_language,
            snippets.join("\n")
        );

        serde_json::json!({
            "model": self.model,
            "temperature": 0.2,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user},
            ],
        })
    }
}

#[async_trait]
impl AnalysisCollaborator for ChatCompletionAnalyst {
    fn name(&self) -> &'static str {
        "chat-completions"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<Analysis> {
        let mut http = self.client.post(&self.endpoint).json(&self.request_body(request));
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http
            .send()
            .await
            .map_err(|e| ReputationError::Analysis(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ReputationError::Analysis(format!("invalid response body: {e}")))?;
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| ReputationError::Analysis("response has no message content".into()))?;

        parse_analysis(content)
    }
}

/// Build the collaborator described by `config`.
///
/// # Errors
///
/// Returns [`ReputationError::Analysis`] if the HTTP client cannot be built.
pub fn from_config(config: &AnalysisConfig) -> Result<Arc<dyn AnalysisCollaborator>> {
    match &config.base_url {
        Some(base_url) => Ok(Arc::new(ChatCompletionAnalyst::new(base_url, config)?)),
        None => Ok(Arc::new(NoAnalysis)),
    }
}

/// Run `collaborator`, replacing any failure with [`Analysis::neutral`].
pub async fn analyze_or_neutral(
    collaborator: &dyn AnalysisCollaborator,
    request: &AnalysisRequest,
) -> Analysis {
    match collaborator.analyze(request).await {
        Ok(analysis) => analysis,
        Err(error) => {
            tracing::warn!(
                collaborator = collaborator.name(),
                error = %error,
                "analysis unavailable, using neutral scores"
            );
            Analysis::neutral()
        }
    }
}

fn map_http_error(status: reqwest::StatusCode, body: &str) -> ReputationError {
    let message = extract_error_message(body);
    match status.as_u16() {
        401 | 403 => ReputationError::Analysis(format!("authentication failed: {message}")),
        429 => ReputationError::Analysis(format!("rate limited: {message}")),
        code => ReputationError::Analysis(format!("HTTP {code}: {message}")),
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Parse the first `{...}` object in a model reply.
///
/// Scores may be numbers or numeric strings and are clamped to `0..=100`.
/// All three scores are required; the rationale may be missing.
fn parse_analysis(content: &str) -> Result<Analysis> {
    let object = extract_json_object(content)
        .ok_or_else(|| ReputationError::Analysis("no JSON object in reply".into()))?;
    let value: Value = serde_json::from_str(object)
        .map_err(|e| ReputationError::Analysis(format!("unparsable reply: {e}")))?;

    let score = |field: &str| -> Result<u8> {
        let raw = match value.get(field) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        raw.filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 100.0).round() as u8)
            .ok_or_else(|| ReputationError::Analysis(format!("reply is missing {field}")))
    };

    Ok(Analysis {
        presence_score: score("presence_score")?,
        tone_score: score("tone_score")?,
        coherence_score: score("coherence_score")?,
        rationale: value
            .get("rationale")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_owned())
            .unwrap_or_default(),
        available: true,
    })
}

fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            query: "Acme".into(),
            context_snippets: vec!["Acme wins award".into(), "Acme opens plant".into()],
            target_language: "fr".into(),
        }
    }

    fn completion(content: &str) -> Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            api_key: Some("sk-test".into()),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    #[test]
    fn parses_plain_object() {
        let a = parse_analysis(
            r#"{"presence_score": 72, "tone_score": 64, "coherence_score": 80, "rationale": " Solide. "}"#,
        )
        .unwrap();
        assert_eq!((a.presence_score, a.tone_score, a.coherence_score), (72, 64, 80));
        assert_eq!(a.rationale, "Solide.");
        assert!(a.available);
    }

    #[test]
    fn parses_object_wrapped_in_prose() {
        let content = "Here you go:\n```json\n{\"presence_score\": \"55\", \"tone_score\": 40.6, \
                       \"coherence_score\": 70}\n```";
        let a = parse_analysis(content).unwrap();
        assert_eq!((a.presence_score, a.tone_score, a.coherence_score), (55, 41, 70));
        assert_eq!(a.rationale, "");
    }

    #[test]
    fn clamps_out_of_range_scores() {
        let a = parse_analysis(
            r#"{"presence_score": 140, "tone_score": -3, "coherence_score": 100}"#,
        )
        .unwrap();
        assert_eq!((a.presence_score, a.tone_score), (100, 0));
    }

    #[test]
    fn rejects_missing_scores_and_garbage() {
        assert!(parse_analysis(r#"{"presence_score": 10}"#).is_err());
        assert!(parse_analysis("I cannot help with that.").is_err());
        assert!(parse_analysis(r#"{"presence_score": "high", "tone_score": 1, "coherence_score": 1}"#).is_err());
        assert!(parse_analysis("} {").is_err());
    }

    #[test]
    fn neutral_defaults() {
        let n = Analysis::neutral();
        assert_eq!((n.presence_score, n.tone_score, n.coherence_score), (50, 50, 50));
        assert_eq!(n.rationale, "not available");
        assert!(!n.available);
    }

    #[test]
    fn analysis_serializes_camel_case() {
        let json = serde_json::to_value(Analysis::neutral()).unwrap();
        assert_eq!(json["coherenceScore"], 50);
        assert_eq!(json["available"], false);
    }

    #[test]
    fn endpoint_accepts_base_with_or_without_version() {
        let a = ChatCompletionAnalyst::new("https://api.example.com/", &config()).unwrap();
        assert_eq!(a.endpoint, "https://api.example.com/v1/chat/completions");
        let b = ChatCompletionAnalyst::new("https://api.example.com/v1", &config()).unwrap();
        assert_eq!(b.endpoint, "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn request_body_caps_snippets() {
        let analyst = ChatCompletionAnalyst::new(
            "https://api.example.com",
            &AnalysisConfig {
                max_snippets: 1,
                ..config()
            },
        )
        .unwrap();
        let body = analyst.request_body(&request());
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Acme wins award"));
        assert!(!user.contains("Acme opens plant"));
        assert!(user.contains("Language: fr"));
        assert_eq!(body["model"], "gpt-4o-mini");
    }

    #[tokio::test]
    async fn no_analysis_is_neutral() {
        let a = analyze_or_neutral(&NoAnalysis, &request()).await;
        assert_eq!(a, Analysis::neutral());
    }

    #[tokio::test]
    async fn calls_chat_completions_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"presence_score": 61, "tone_score": 58, "coherence_score": 66, "rationale": "Couverture stable."}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let analyst = ChatCompletionAnalyst::new(&server.uri(), &config()).unwrap();
        let a = analyze_or_neutral(&analyst, &request()).await;
        assert!(a.available);
        assert_eq!(a.coherence_score, 66);
        assert_eq!(a.rationale, "Couverture stable.");
    }

    #[tokio::test]
    async fn server_error_degrades_to_neutral() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"error": {"message": "boom"}})),
            )
            .mount(&server)
            .await;

        let analyst = ChatCompletionAnalyst::new(&server.uri(), &config()).unwrap();
        let err = analyst.analyze(&request()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500: boom"));
        assert_eq!(analyze_or_neutral(&analyst, &request()).await, Analysis::neutral());
    }

    #[tokio::test]
    async fn malformed_reply_degrades_to_neutral() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("no idea")))
            .mount(&server)
            .await;

        let analyst = ChatCompletionAnalyst::new(&server.uri(), &config()).unwrap();
        assert_eq!(analyze_or_neutral(&analyst, &request()).await, Analysis::neutral());
    }

    #[test]
    fn from_config_without_endpoint_is_noop() {
        let collaborator = from_config(&AnalysisConfig::default()).unwrap();
        assert_eq!(collaborator.name(), "none");
    }
}
