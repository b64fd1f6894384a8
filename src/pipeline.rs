//! Per-topic trend discovery.
//!
//! For each topic: search, aggregate candidate names, derive the top name,
//! skip if that (topic, day, top name) is already recorded, otherwise score
//! the joined names and record the trend.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use scout_extract::{
    AggregationResult, BraveConfig, BraveSearchProvider, CandidateFinder, HttpFetcher, PageFetcher,
    SearchProvider,
};

use crate::config::{Credentials, ScoutConfig, TopNamePolicy, TopicSpec};
use crate::error::{Result, ScoutError};
use crate::scoring::{OpenAiScorer, OpenAiScoringConfig, Scorer};
use crate::store::{NewTrend, TrendStore};

/// What happened to one topic.
#[derive(Debug, Clone, PartialEq)]
pub enum TopicOutcome {
    /// The search produced no usable names. Nothing was scored or stored.
    NoCandidates,
    /// A trend with the same key was already recorded. Nothing was scored.
    AlreadyRecorded {
        /// The top name that was found again.
        top_name: String,
    },
    /// A new trend was scored and stored.
    Recorded {
        /// Recorded top name.
        top_name: String,
        /// Recorded score.
        score: f64,
        /// The candidates the score is based on.
        candidates: AggregationResult,
    },
}

/// Result of one topic within a batch.
#[derive(Debug)]
pub struct TopicReport {
    /// The topic processed.
    pub topic: TopicSpec,
    /// Its outcome, or the error that stopped it.
    pub result: Result<TopicOutcome>,
}

/// Options that shape queries and stored rows.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Appended to queries that do not already contain it.
    pub site_hint: String,
    /// How the top name is derived from the candidates.
    pub top_name: TopNamePolicy,
}

impl RunOptions {
    /// Take the options from a loaded configuration.
    pub fn from_config(config: &ScoutConfig) -> Self {
        Self {
            site_hint: config.search.site_hint.clone(),
            top_name: config.store.top_name,
        }
    }
}

/// Trend discovery driver over pluggable collaborators.
pub struct TrendScout<P, F, S> {
    provider: P,
    fetcher: F,
    finder: CandidateFinder,
    scorer: S,
    store: TrendStore,
    options: RunOptions,
}

/// The production driver: Brave search, HTTP page fetching, OpenAI scoring.
pub type DefaultTrendScout = TrendScout<BraveSearchProvider, HttpFetcher, OpenAiScorer>;

impl DefaultTrendScout {
    /// Wire up the production collaborators from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the lexicon cannot
    /// be loaded, or the store cannot be opened.
    pub fn from_config(config: &ScoutConfig, credentials: &Credentials) -> Result<Self> {
        config.validate()?;
        let provider = brave_provider(config, &credentials.brave_api_key)?;
        let fetcher = HttpFetcher::new(&config.extract)?;
        let finder = CandidateFinder::from_config(config.extract.clone())?;
        let scorer = OpenAiScorer::new(OpenAiScoringConfig::from_settings(
            &config.scoring,
            credentials.openai_api_key.clone(),
        ))?;
        let store = TrendStore::open(&config.store.resolved_path())?;
        Ok(Self::new(
            provider,
            fetcher,
            finder,
            scorer,
            store,
            RunOptions::from_config(config),
        ))
    }
}

impl<P, F, S> TrendScout<P, F, S>
where
    P: SearchProvider,
    F: PageFetcher,
    S: Scorer,
{
    /// Assemble a driver from its parts.
    pub fn new(
        provider: P,
        fetcher: F,
        finder: CandidateFinder,
        scorer: S,
        store: TrendStore,
        options: RunOptions,
    ) -> Self {
        Self {
            provider,
            fetcher,
            finder,
            scorer,
            store,
            options,
        }
    }

    /// The trend store.
    pub fn store(&self) -> &TrendStore {
        &self.store
    }

    /// Process one topic for today's (UTC) period.
    ///
    /// # Errors
    ///
    /// Returns an error if the search, the scoring or the store fails.
    pub async fn run_topic(&self, topic: &TopicSpec) -> Result<TopicOutcome> {
        self.run_topic_on(topic, Utc::now().date_naive()).await
    }

    /// Process one topic for an explicit period.
    ///
    /// # Errors
    ///
    /// Returns an error if the search, the scoring or the store fails.
    pub async fn run_topic_on(&self, topic: &TopicSpec, period: NaiveDate) -> Result<TopicOutcome> {
        let topic_id = self.store.ensure_topic(topic)?;
        let query = build_query(&topic.topic, &self.options.site_hint);
        tracing::trace!(%query, topic_id, "searching");

        let results = self
            .provider
            .search(&query)
            .await
            .map_err(|e| ScoutError::Search(e.to_string()))?;
        let candidates = self
            .finder
            .aggregate(&query, &results, &self.fetcher)
            .await;

        let Some(top_name) = top_name(&candidates, self.options.top_name) else {
            tracing::warn!(topic = %topic.topic, "no candidate names found");
            return Ok(TopicOutcome::NoCandidates);
        };

        if self.store.trend_exists(topic_id, period, &top_name)? {
            tracing::info!(topic = %topic.topic, %top_name, "already recorded, skipping");
            return Ok(TopicOutcome::AlreadyRecorded { top_name });
        }

        let score = self.scorer.score(&candidates.joined_text).await?;
        let inserted = self.store.record_trend(&NewTrend {
            topic_id,
            period,
            score,
            top_name: &top_name,
        })?;
        if !inserted {
            return Ok(TopicOutcome::AlreadyRecorded { top_name });
        }

        tracing::info!(topic = %topic.topic, topic_id, %top_name, score, "trend recorded");
        Ok(TopicOutcome::Recorded {
            top_name,
            score,
            candidates,
        })
    }

    /// Process topics one after another. A failing topic is logged and
    /// does not stop the batch.
    pub async fn run_all(&self, topics: &[TopicSpec]) -> Vec<TopicReport> {
        let mut reports = Vec::with_capacity(topics.len());
        for topic in topics {
            let result = self.run_topic(topic).await;
            if let Err(e) = &result {
                tracing::error!(topic = %topic.topic, error = %e, "topic failed");
            }
            reports.push(TopicReport {
                topic: topic.clone(),
                result,
            });
        }
        reports
    }
}

/// Build a Brave provider from the `[search]` section.
///
/// # Errors
///
/// Returns an error if the key is empty or the client cannot be built.
pub fn brave_provider(config: &ScoutConfig, api_key: &str) -> Result<BraveSearchProvider> {
    let settings = &config.search;
    let brave = BraveConfig::new(api_key)
        .with_endpoint(settings.endpoint.clone())
        .with_count(settings.count)
        .with_timeout(Duration::from_secs(settings.timeout_seconds));
    BraveSearchProvider::new(brave).map_err(ScoutError::from)
}

/// Append `site_hint` to `topic` unless the topic already contains it.
pub fn build_query(topic: &str, site_hint: &str) -> String {
    let topic = topic.trim();
    let hint = site_hint.trim();
    if hint.is_empty() || topic.contains(hint) {
        topic.to_owned()
    } else {
        format!("{topic} {hint}")
    }
}

/// Derive the recorded top name. `None` when there are no candidates.
pub fn top_name(candidates: &AggregationResult, policy: TopNamePolicy) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }
    match policy {
        TopNamePolicy::Joined => Some(candidates.joined_text.clone()),
        TopNamePolicy::First => candidates.first_name().map(str::to_owned),
    }
}
