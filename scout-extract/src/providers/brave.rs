//! Brave Search web API provider.
//!
//! Uses the JSON web-search endpoint, authenticated with the
//! `X-Subscription-Token` header. Only `web.results[].title` and
//! `web.results[].url` are read.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ExtractError;
use crate::provider::SearchProvider;
use crate::types::SearchResultItem;

/// Default Brave web-search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

/// Default number of results requested per query.
pub const DEFAULT_COUNT: u32 = 20;

/// Connection settings for [`BraveSearchProvider`].
#[derive(Clone)]
pub struct BraveConfig {
    api_key: String,
    endpoint: String,
    count: u32,
    timeout: Duration,
}

impl BraveConfig {
    /// Settings for the public endpoint with the given subscription token.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            count: DEFAULT_COUNT,
            timeout: Duration::from_secs(10),
        }
    }

    /// Override the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the number of results requested.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for BraveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraveConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("count", &self.count)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`SearchProvider`] backed by the Brave web-search API.
#[derive(Debug, Clone)]
pub struct BraveSearchProvider {
    client: reqwest::Client,
    config: BraveConfig,
}

impl BraveSearchProvider {
    /// Build a provider.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] if the API key is empty and
    /// [`ExtractError::Http`] if the HTTP client cannot be built.
    pub fn new(config: BraveConfig) -> Result<Self, ExtractError> {
        if config.api_key.trim().is_empty() {
            return Err(ExtractError::Config("Brave API key is empty".into()));
        }
        if config.count == 0 {
            return Err(ExtractError::Config(
                "Brave result count must be greater than 0".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExtractError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

impl SearchProvider for BraveSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchResultItem>, ExtractError> {
        tracing::trace!(query, count = self.config.count, "brave search");

        let count = self.config.count.to_string();
        let response = self
            .client
            .get(&self.config.endpoint)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.config.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| ExtractError::Http(format!("Brave request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Http(format!("Brave returned HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExtractError::Http(format!("reading Brave response failed: {e}")))?;
        let items = parse_brave_json(&body)?;
        tracing::debug!(count = items.len(), "brave results parsed");
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "brave"
    }
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: Option<String>,
    url: Option<String>,
}

/// Parse a Brave web-search response body.
///
/// A response without a `web` section yields an empty list. Results missing
/// a title or URL are skipped.
pub(crate) fn parse_brave_json(body: &str) -> Result<Vec<SearchResultItem>, ExtractError> {
    let response: BraveResponse = serde_json::from_str(body)
        .map_err(|e| ExtractError::Parse(format!("invalid Brave response: {e}")))?;

    let Some(web) = response.web else {
        return Ok(Vec::new());
    };

    Ok(web
        .results
        .into_iter()
        .filter_map(|r| match (r.title, r.url) {
            (Some(title), Some(url)) if !url.is_empty() => Some(SearchResultItem { title, url }),
            _ => None,
        })
        .collect())
}
