//! HTTP surface.
//!
//! | route                    | body                       | kind  |
//! |--------------------------|----------------------------|-------|
//! | `POST /reputation`       | `{query, countries}`       | web   |
//! | `POST /press-reputation` | `{query, countries}`       | press |
//! | `GET /health`            |                            |       |
//!
//! Invalid input is answered with `400 {error}` before any search runs.
//! A crashed aggregation is answered with `500 {error, processingTimeMs}`.

use std::collections::HashSet;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reputation_search::{Country, FetchOutcome, ResultCache, SearchKind};
use serde::{Deserialize, Serialize};

use crate::aggregator::{CountryAggregator, GlobalReport};
use crate::config::ReputationConfig;
use crate::error::{ReputationError, Result};
use crate::pipeline::Pipeline;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    aggregator: CountryAggregator,
    max_countries: usize,
}

impl AppState {
    pub fn new(aggregator: CountryAggregator, max_countries: usize) -> Self {
        Self {
            aggregator,
            max_countries,
        }
    }
}

/// Body of both reputation routes.
#[derive(Debug, Clone, Deserialize)]
pub struct ReputationRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub countries: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReputationResponse {
    #[serde(flatten)]
    report: GlobalReport,
    processing_time_ms: u64,
}

/// Router with every route mounted.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/reputation", post(web_reputation))
        .route("/press-reputation", post(press_reputation))
        .with_state(state)
}

/// Router wired from `config`, sharing `cache`.
///
/// # Errors
///
/// Returns an error if the pipeline cannot be constructed.
pub fn router_from_config(
    config: &ReputationConfig,
    cache: ResultCache<FetchOutcome>,
) -> Result<Router> {
    let pipeline = Pipeline::from_config(config, cache)?;
    let state = AppState::new(CountryAggregator::new(pipeline), config.limits.max_countries);
    Ok(build_router(state))
}

/// Bind `server.host:server.port` and serve until the process stops.
///
/// # Errors
///
/// Returns an error if the pipeline cannot be built or the listener
/// cannot bind.
pub async fn serve(config: &ReputationConfig, cache: ResultCache<FetchOutcome>) -> Result<()> {
    let app = router_from_config(config, cache)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        search_credentials = config.search.has_credentials(),
        analysis = config.analysis.base_url.is_some(),
        "reputation server listening on http://{local_addr}"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

async fn web_reputation(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReputationRequest>, JsonRejection>,
) -> Response {
    handle(state, payload, SearchKind::Web).await
}

async fn press_reputation(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReputationRequest>, JsonRejection>,
) -> Response {
    handle(state, payload, SearchKind::Press).await
}

async fn handle(
    state: AppState,
    payload: std::result::Result<Json<ReputationRequest>, JsonRejection>,
    kind: SearchKind,
) -> Response {
    let started = Instant::now();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(&rejection.body_text()),
    };
    let (query, countries) = match validate(&state, &request) {
        Ok(valid) => valid,
        Err(error) => return bad_request(&error.to_string()),
    };

    tracing::debug!(%query, "reputation request");
    let aggregator = state.aggregator.clone();
    let task_query = query.clone();
    let task_countries = countries.clone();
    let joined = tokio::spawn(async move {
        aggregator
            .aggregate(&task_query, &task_countries, kind)
            .await
    })
    .await;
    let processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match joined {
        Ok(report) => {
            tracing::info!(
                %kind,
                countries = countries.len(),
                average = report.average_score,
                processing_time_ms,
                "reputation request served"
            );
            (
                StatusCode::OK,
                Json(ReputationResponse {
                    report,
                    processing_time_ms,
                }),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!(%kind, error = %error, "aggregation crashed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "reputation analysis failed",
                    "processingTimeMs": processing_time_ms,
                })),
            )
                .into_response()
        }
    }
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

/// Check a request at the boundary, returning the trimmed query and the
/// parsed countries in request order.
fn validate(
    state: &AppState,
    request: &ReputationRequest,
) -> Result<(String, Vec<Country>)> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ReputationError::InvalidRequest("query must not be empty".into()));
    }
    if state
        .aggregator
        .pipeline()
        .query_builder()
        .sanitize(query)
        .is_empty()
    {
        return Err(ReputationError::InvalidRequest(
            "query contains no searchable text".into(),
        ));
    }

    if request.countries.is_empty() {
        return Err(ReputationError::InvalidRequest(
            "countries must not be empty".into(),
        ));
    }
    if request.countries.len() > state.max_countries {
        return Err(ReputationError::InvalidRequest(format!(
            "at most {} countries are allowed",
            state.max_countries
        )));
    }

    let mut seen = HashSet::with_capacity(request.countries.len());
    let mut countries = Vec::with_capacity(request.countries.len());
    for code in &request.countries {
        let country = Country::from_code(code).ok_or_else(|| {
            ReputationError::InvalidRequest(format!("unsupported country code: {}", code.trim()))
        })?;
        if !seen.insert(country) {
            return Err(ReputationError::InvalidRequest(format!(
                "duplicate country code: {}",
                country.code()
            )));
        }
        countries.push(country);
    }

    Ok((query.to_owned(), countries))
}
