//! Extraction configuration with sensible defaults.
//!
//! [`ExtractConfig`] bounds a single aggregation run (how many search
//! results to inspect, how many names to keep) and controls page fetching.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Configuration for candidate extraction.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides. Deserializes with missing fields filled from defaults,
/// so it can be embedded as a section of a larger TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Hard cap on the number of names emitted per run.
    pub max_candidates: usize,
    /// Maximum number of search-result items inspected per run.
    pub scan_budget: usize,
    /// How many hub/listing pages may be fetched ahead of the item being
    /// processed. `1` keeps fetching strictly sequential.
    pub fetch_concurrency: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// How long fetched pages are cached in seconds. Set to 0 to disable.
    pub page_cache_ttl_seconds: u64,
    /// Replacement lexicon file. If `None`, the built-in lexicon is used.
    pub lexicon_path: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_candidates: 3,
            scan_budget: 50,
            fetch_concurrency: 1,
            timeout_seconds: 10,
            user_agent: None,
            page_cache_ttl_seconds: 600,
            lexicon_path: None,
        }
    }
}

impl ExtractConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_candidates` must be greater than 0
    /// - `scan_budget` must be greater than 0
    /// - `fetch_concurrency` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.max_candidates == 0 {
            return Err(ExtractError::Config(
                "max_candidates must be greater than 0".into(),
            ));
        }
        if self.scan_budget == 0 {
            return Err(ExtractError::Config(
                "scan_budget must be greater than 0".into(),
            ));
        }
        if self.fetch_concurrency == 0 {
            return Err(ExtractError::Config(
                "fetch_concurrency must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(ExtractError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
