//! One country's run: fetch (through the cache), dedup, score, analyse.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reputation_search::fallback::synthetic_results;
use reputation_search::{
    deduplicate, search, CacheKey, Country, FetchOutcome, QueryBuilder, ResultCache,
    SearchGateway, SearchKind, SearchOptions,
};
use serde::{Deserialize, Serialize};

use crate::analysis::{self, analyze_or_neutral, Analysis, AnalysisCollaborator, AnalysisRequest};
use crate::article::{ArticleScorer, ScoredArticle};
use crate::config::ReputationConfig;
use crate::error::Result;
use crate::scoring::composite::{CompositeScorer, CompositeScores};

/// Lifetime of cached synthetic outcomes, so a recovered provider is
/// picked up quickly.
pub const SYNTHETIC_TTL: Duration = Duration::from_secs(60);

/// Scores for one requested country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryScore {
    pub country_code: Country,
    pub country_name: String,
    pub flag: String,
    pub language: String,
    /// `0..=100`.
    pub presence_score: u8,
    /// `-100..=100`.
    pub tonality_score: i32,
    pub volume_score: f64,
    pub authority_score: f64,
    pub diversity_score: f64,
    pub recency_score: f64,
    /// Mean of presence, tone and coherence in `0..=100`.
    pub global_score: u8,
    pub article_count: usize,
    /// Built from placeholder data rather than provider results.
    pub synthetic: bool,
    pub from_cache: bool,
    pub analysis: Analysis,
    /// Highest-relevance articles, best first.
    pub top_articles: Vec<ScoredArticle>,
}

/// `round((presence + tone + coherence) / 3)` clamped to `0..=100`, where
/// `tone` maps tonality from `-100..=100` onto `0..=100`.
pub fn global_score(presence: u8, tonality: i32, coherence: u8) -> u8 {
    let tone = (f64::from(tonality.clamp(-100, 100)) + 100.0) / 2.0;
    let mean = (f64::from(presence) + tone + f64::from(coherence)) / 3.0;
    mean.round().clamp(0.0, 100.0) as u8
}

/// The per-country pipeline. Cheap to clone; clones share the cache and
/// the collaborators.
#[derive(Clone)]
pub struct Pipeline {
    gateway: SearchGateway,
    cache: ResultCache<FetchOutcome>,
    builder: QueryBuilder,
    scorer: ArticleScorer,
    composite: CompositeScorer,
    analyst: Arc<dyn AnalysisCollaborator>,
    ttl: Duration,
    max_results: usize,
    top_articles: usize,
}

impl Pipeline {
    /// Pipeline with default scoring, a one-hour TTL and five top articles.
    pub fn new(
        gateway: SearchGateway,
        cache: ResultCache<FetchOutcome>,
        analyst: Arc<dyn AnalysisCollaborator>,
    ) -> Self {
        Self {
            gateway,
            cache,
            builder: QueryBuilder::default(),
            scorer: ArticleScorer::default(),
            composite: CompositeScorer,
            analyst,
            ttl: Duration::from_secs(3600),
            max_results: 10,
            top_articles: 5,
        }
    }

    /// Build every collaborator from `config`, sharing `cache`.
    ///
    /// # Errors
    ///
    /// Returns an error if the search gateway or analysis client cannot
    /// be constructed.
    pub fn from_config(config: &ReputationConfig, cache: ResultCache<FetchOutcome>) -> Result<Self> {
        let gateway = SearchGateway::from_config(&config.search)?;
        let analyst = analysis::from_config(&config.analysis)?;
        let builder = QueryBuilder {
            press_variants: config.search.press_variants,
            ..QueryBuilder::default()
        };
        Ok(Self::new(gateway, cache, analyst)
            .with_query_builder(builder)
            .with_ttl(Duration::from_secs(config.cache.ttl_secs))
            .with_max_results(config.search.max_results)
            .with_top_articles(config.limits.top_articles))
    }

    pub fn with_query_builder(mut self, builder: QueryBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_scorer(mut self, scorer: ArticleScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Cache lifetime of provider results.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_top_articles(mut self, top_articles: usize) -> Self {
        self.top_articles = top_articles;
        self
    }

    /// The query builder requests are validated against.
    pub fn query_builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// The shared analysis collaborator.
    pub fn analyst(&self) -> &dyn AnalysisCollaborator {
        self.analyst.as_ref()
    }

    /// Score `query` for one country.
    ///
    /// Never fails: provider trouble surfaces as `synthetic: true`.
    pub async fn run_country(&self, query: &str, country: Country, kind: SearchKind) -> CountryScore {
        let options = SearchOptions::for_country(country, self.max_results);
        let key = CacheKey::new(query, &options, kind);

        let (gateway, builder, scope, ttl) = (&self.gateway, &self.builder, &options, self.ttl);
        let (outcome, from_cache) = self
            .cache
            .get_or_set_with_ttl(key, move || async move {
                let outcome = search(gateway, builder, query, scope, kind).await;
                let ttl = if outcome.is_synthetic() {
                    SYNTHETIC_TTL.min(ttl)
                } else {
                    ttl
                };
                (outcome, ttl)
            })
            .await;

        tracing::debug!(
            country = country.code(),
            %kind,
            from_cache,
            synthetic = outcome.is_synthetic(),
            attempts = outcome.attempts,
            count = outcome.results.len(),
            "fetched country results"
        );

        let synthetic = outcome.is_synthetic();
        let articles = self
            .scorer
            .score_all(query, deduplicate(outcome.results), &options);
        let analysis = if synthetic {
            Analysis::neutral()
        } else {
            let request = self.analysis_request(query, country.language(), &articles);
            analyze_or_neutral(self.analyst.as_ref(), &request).await
        };

        self.assemble(country, articles, analysis, synthetic, from_cache)
    }

    /// Score built purely from the synthetic fallback, used when a
    /// country's run could not complete.
    pub fn synthetic_country_score(&self, query: &str, country: Country) -> CountryScore {
        let options = SearchOptions::for_country(country, self.max_results);
        let articles = self
            .scorer
            .score_all(query, synthetic_results(query, &options), &options);
        self.assemble(country, articles, Analysis::neutral(), true, false)
    }

    /// Analysis input built from the given articles' titles and snippets.
    pub fn analysis_request(
        &self,
        query: &str,
        target_language: &str,
        articles: &[ScoredArticle],
    ) -> AnalysisRequest {
        AnalysisRequest {
            query: query.to_owned(),
            context_snippets: articles
                .iter()
                .map(|a| format!("{} ({}): {}", a.raw.title, a.raw.source_domain, a.raw.snippet))
                .collect(),
            target_language: target_language.to_owned(),
        }
    }

    fn assemble(
        &self,
        country: Country,
        mut articles: Vec<ScoredArticle>,
        analysis: Analysis,
        synthetic: bool,
        from_cache: bool,
    ) -> CountryScore {
        let CompositeScores {
            volume,
            authority,
            diversity,
            recency,
            presence,
            tonality,
        } = self.composite.score(&articles, Utc::now());
        let article_count = articles.len();

        // Stable: ties keep provider rank.
        articles.sort_by(|a, b| b.relevance.cmp(&a.relevance));
        articles.truncate(self.top_articles);

        CountryScore {
            country_code: country,
            country_name: country.name().to_owned(),
            flag: country.flag().to_owned(),
            language: country.language().to_owned(),
            presence_score: presence,
            tonality_score: tonality,
            volume_score: volume,
            authority_score: authority,
            diversity_score: diversity,
            recency_score: recency,
            global_score: global_score(presence, tonality, analysis.coherence_score),
            article_count,
            synthetic,
            from_cache,
            analysis,
            top_articles: articles,
        }
    }
}
