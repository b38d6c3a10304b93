//! Cross-country fan-out and the global report.
//!
//! One task per requested country runs [`Pipeline::run_country`]. A task
//! that dies (panics or is cancelled) is replaced with a synthetic score
//! for that country, so the report always has exactly one entry per
//! requested country. Results are sorted by `globalScore` (descending,
//! ties by country code) regardless of completion order.

use futures_util::future::join_all;
use reputation_search::{Country, SearchKind};
use serde::{Deserialize, Serialize};

use crate::analysis::{analyze_or_neutral, Analysis};
use crate::error::ReputationError;
use crate::pipeline::{CountryScore, Pipeline};

/// Language of the cross-country rationale.
const GLOBAL_ANALYSIS_LANGUAGE: &str = "en";

/// Headline entry for the best or worst country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryRanking {
    pub country_code: Country,
    pub country_name: String,
    pub flag: String,
    pub global_score: u8,
}

impl From<&CountryScore> for CountryRanking {
    fn from(score: &CountryScore) -> Self {
        Self {
            country_code: score.country_code,
            country_name: score.country_name.clone(),
            flag: score.flag.clone(),
            global_score: score.global_score,
        }
    }
}

/// Per-request summary across countries. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalReport {
    pub query: String,
    pub total_countries: usize,
    /// Sorted by `globalScore`, best first.
    pub results: Vec<CountryScore>,
    pub best_country: Option<CountryRanking>,
    pub worst_country: Option<CountryRanking>,
    /// Mean `globalScore` over every result, one decimal.
    pub average_score: f64,
    pub global_analysis: Analysis,
}

/// Runs the pipeline for several countries concurrently.
#[derive(Clone)]
pub struct CountryAggregator {
    pipeline: Pipeline,
}

impl CountryAggregator {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// The underlying per-country pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Score `query` in every country of `countries` and summarise.
    pub async fn aggregate(&self, query: &str, countries: &[Country], kind: SearchKind) -> GlobalReport {
        let handles: Vec<_> = countries
            .iter()
            .map(|&country| {
                let pipeline = self.pipeline.clone();
                let query = query.to_owned();
                tokio::spawn(async move { pipeline.run_country(&query, country, kind).await })
            })
            .collect();

        let mut results: Vec<CountryScore> = join_all(handles)
            .await
            .into_iter()
            .zip(countries)
            .map(|(joined, &country)| {
                joined
                    .map_err(|e| ReputationError::Pipeline(e.to_string()))
                    .unwrap_or_else(|error| {
                        tracing::warn!(
                            country = country.code(),
                            error = %error,
                            "country run failed, substituting synthetic score"
                        );
                        self.pipeline.synthetic_country_score(query, country)
                    })
            })
            .collect();

        rank(&mut results);

        let global_analysis = self.global_analysis(query, &results).await;
        tracing::info!(
            countries = results.len(),
            %kind,
            synthetic = results.iter().filter(|r| r.synthetic).count(),
            "aggregation complete"
        );

        GlobalReport {
            query: query.to_owned(),
            total_countries: results.len(),
            best_country: results.first().map(CountryRanking::from),
            worst_country: results.last().map(CountryRanking::from),
            average_score: average_score(&results),
            results,
            global_analysis,
        }
    }

    /// One collaborator call over every country's top articles. Skipped
    /// when all countries are synthetic.
    async fn global_analysis(&self, query: &str, results: &[CountryScore]) -> Analysis {
        let real: Vec<_> = results
            .iter()
            .filter(|r| !r.synthetic)
            .flat_map(|r| r.top_articles.iter().cloned())
            .collect();
        if real.is_empty() {
            return Analysis::neutral();
        }
        let request = self
            .pipeline
            .analysis_request(query, GLOBAL_ANALYSIS_LANGUAGE, &real);
        analyze_or_neutral(self.pipeline.analyst(), &request).await
    }
}

/// Sort by `global_score` descending; ties by country code for a
/// deterministic order.
pub fn rank(results: &mut [CountryScore]) {
    results.sort_by(|a, b| {
        b.global_score
            .cmp(&a.global_score)
            .then_with(|| a.country_code.code().cmp(b.country_code.code()))
    });
}

/// Mean `global_score`, rounded to one decimal. 0 for no results.
pub fn average_score(results: &[CountryScore]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let total: f64 = results.iter().map(|r| f64::from(r.global_score)).sum();
    (total / results.len() as f64 * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::analysis::NoAnalysis;
    use reputation_search::{GatewayConfig, ResultCache, SearchGateway};
    use std::sync::Arc;

    fn pipeline() -> Pipeline {
        // No credentials: every run is synthetic and offline.
        let gateway = SearchGateway::from_config(&GatewayConfig::default()).unwrap();
        Pipeline::new(gateway, ResultCache::new(100), Arc::new(NoAnalysis))
    }

    fn score(country: Country, global: u8) -> CountryScore {
        let mut s = pipeline().synthetic_country_score("Acme", country);
        s.global_score = global;
        s
    }

    #[test]
    fn rank_orders_by_score_then_code() {
        let mut results = vec![
            score(Country::Germany, 40),
            score(Country::France, 70),
            score(Country::Spain, 70),
            score(Country::Italy, 10),
        ];
        rank(&mut results);
        let codes: Vec<&str> = results.iter().map(|r| r.country_code.code()).collect();
        assert_eq!(codes, vec!["ES", "FR", "DE", "IT"]);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let results = vec![
            score(Country::France, 70),
            score(Country::Germany, 41),
            score(Country::Spain, 40),
        ];
        assert_eq!(average_score(&results), 50.3);
        assert_eq!(average_score(&[]), 0.0);
    }

    #[tokio::test]
    async fn one_result_per_country_in_rank_order() {
        let countries = [Country::France, Country::Germany, Country::Japan];
        let report = CountryAggregator::new(pipeline())
            .aggregate("Acme", &countries, SearchKind::Web)
            .await;

        assert_eq!(report.total_countries, 3);
        assert_eq!(report.results.len(), 3);
        assert!(report.results.iter().all(|r| r.synthetic));
        assert!(report
            .results
            .windows(2)
            .all(|w| w[0].global_score >= w[1].global_score));
        assert_eq!(
            report.best_country.unwrap().country_code,
            report.results[0].country_code
        );
        assert_eq!(
            report.worst_country.unwrap().country_code,
            report.results[2].country_code
        );
        assert_eq!(report.global_analysis, Analysis::neutral());
    }

    #[tokio::test]
    async fn report_serializes_camel_case() {
        let report = CountryAggregator::new(pipeline())
            .aggregate("Acme", &[Country::Canada], SearchKind::Press)
            .await;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["totalCountries"], 1);
        assert_eq!(json["bestCountry"]["countryCode"], "CA");
        assert!(json["averageScore"].is_number());
        assert!(json["globalAnalysis"].is_object());
    }
}
