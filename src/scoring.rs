//! Topicality scoring of candidate names.
//!
//! The joined candidate text is sent to an OpenAI-compatible chat
//! completions endpoint whose system prompt asks for a JSON reply of the
//! form `{"score": n}` with `n` between 0 and 100.

use std::time::Duration;

use serde::Deserialize;

use crate::config::ScoringSettings;
use crate::error::{Result, ScoutError};

/// Highest score the model may return.
pub const MAX_SCORE: f64 = 100.0;

/// Scores a piece of text for topicality.
///
/// All implementations must be `Send + Sync` so one scorer can serve a
/// whole batch.
pub trait Scorer: Send + Sync {
    /// Score `text` on a 0 to 100 scale.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Scoring`] if no usable score was obtained.
    /// Callers must not substitute a default score on error.
    fn score(&self, text: &str) -> impl std::future::Future<Output = Result<f64>> + Send;
}

/// Configuration for [`OpenAiScorer`].
#[derive(Clone)]
pub struct OpenAiScoringConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base URL (defaults to `https://api.openai.com`).
    pub base_url: String,
    /// The model to use.
    pub model: String,
    /// System prompt sent before the candidate text.
    pub system_prompt: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAiScoringConfig {
    /// Create a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let defaults = ScoringSettings::default();
        Self {
            api_key: api_key.into(),
            base_url: defaults.base_url,
            model: model.into(),
            system_prompt: defaults.system_prompt,
            timeout: Duration::from_secs(defaults.timeout_seconds),
        }
    }

    /// Build a config from the `[scoring]` section and an API key.
    pub fn from_settings(settings: &ScoringSettings, api_key: impl Into<String>) -> Self {
        Self::new(api_key, settings.model.clone())
            .with_base_url(settings.base_url.clone())
            .with_system_prompt(settings.system_prompt.clone())
            .with_timeout(Duration::from_secs(settings.timeout_seconds))
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for OpenAiScoringConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiScoringConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`Scorer`] backed by the chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAiScorer {
    client: reqwest::Client,
    config: OpenAiScoringConfig,
}

impl OpenAiScorer {
    /// Create a scorer.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Scoring`] if the HTTP client cannot be built.
    pub fn new(config: OpenAiScoringConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScoutError::Scoring(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

impl Scorer for OpenAiScorer {
    async fn score(&self, text: &str) -> Result<f64> {
        if text.trim().is_empty() {
            tracing::debug!("empty scoring input, score is 0");
            return Ok(0.0);
        }

        let body = build_request(&self.config.model, &self.config.system_prompt, text);
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScoutError::Scoring(format!("request failed: {e}")))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| ScoutError::Scoring(format!("reading response failed: {e}")))?;
        if !status.is_success() {
            tracing::debug!(%status, body = %raw, "scoring API error body");
            return Err(ScoutError::Scoring(format!("API returned HTTP {status}")));
        }

        let score = parse_completion(&raw)?;
        tracing::debug!(score, model = %self.config.model, "text scored");
        Ok(score)
    }
}

/// Build the chat completions request body.
pub fn build_request(model: &str, system_prompt: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [
            {"role": "system", "content": system_prompt},
            {"role": "user", "content": text},
        ],
    })
}

#[derive(Debug, Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScoreReply {
    score: f64,
}

/// Extract the score from a chat completions response body.
///
/// # Errors
///
/// Returns [`ScoutError::Scoring`] if the body, the first choice or its
/// content is missing or malformed.
pub fn parse_completion(body: &str) -> Result<f64> {
    let completion: Completion = serde_json::from_str(body)
        .map_err(|e| ScoutError::Scoring(format!("invalid completion response: {e}")))?;
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ScoutError::Scoring("completion has no content".into()))?;
    parse_score_reply(&content)
}

/// Parse the model's `{"score": n}` reply.
///
/// Text around the JSON object, such as a Markdown code fence, is ignored.
///
/// # Errors
///
/// Returns [`ScoutError::Scoring`] if no object with a score between 0 and
/// [`MAX_SCORE`] is found.
pub fn parse_score_reply(content: &str) -> Result<f64> {
    let json = match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => {
            return Err(ScoutError::Scoring(format!(
                "reply is not a JSON object: {content:?}"
            )));
        }
    };
    let reply: ScoreReply = serde_json::from_str(json)
        .map_err(|e| ScoutError::Scoring(format!("reply has no score: {e}")))?;
    if !reply.score.is_finite() || !(0.0..=MAX_SCORE).contains(&reply.score) {
        return Err(ScoutError::Scoring(format!(
            "score {} is outside 0..={MAX_SCORE}",
            reply.score
        )));
    }
    Ok(reply.score)
}
