//! trend-scout: topic trend discovery from review-site search results.
//!
//! For each configured topic the batch searches the web, reduces the noisy
//! results to a short list of entity names with [`scout_extract`], asks a
//! language model how topical those names are, and records the score in a
//! local SQLite database.
//!
//! # Architecture
//!
//! - **Search**: Brave web-search API behind [`scout_extract::SearchProvider`]
//! - **Extraction**: URL classification, link extraction and name cleaning
//!   in [`scout_extract::CandidateFinder`]
//! - **Scoring**: chat completions behind [`scoring::Scorer`]
//! - **Storage**: one row per topic, day and top name in [`store::TrendStore`]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod scoring;
pub mod store;

pub use config::{Credentials, ScoutConfig, TopNamePolicy, TopicSpec};
pub use error::{Result, ScoutError};
pub use pipeline::{DefaultTrendScout, RunOptions, TopicOutcome, TopicReport, TrendScout};
pub use scoring::{OpenAiScorer, OpenAiScoringConfig, Scorer};
pub use store::{NewTrend, TrendRecord, TrendStore};
