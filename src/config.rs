//! Configuration types for trend-scout.
//!
//! Everything lives in one TOML file. Every section is optional and falls
//! back to defaults, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use scout_extract::ExtractConfig;
use scout_extract::providers::brave::{DEFAULT_COUNT, DEFAULT_ENDPOINT};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// Default system prompt for the scoring model.
pub const DEFAULT_SYSTEM_PROMPT: &str = "以下の店舗名のリストから、話題性を100点満点でスコアリングしてください。JSONで {\"score\": 数値 } の形で返してください。";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Search provider settings.
    pub search: SearchSettings,
    /// Candidate extraction settings.
    pub extract: ExtractConfig,
    /// Scoring service settings.
    pub scoring: ScoringSettings,
    /// Trend store settings.
    pub store: StoreSettings,
    /// Topics processed by `run`.
    pub topics: Vec<TopicSpec>,
}

/// Search provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Brave web-search endpoint.
    pub endpoint: String,
    /// Results requested per query.
    pub count: u32,
    /// Environment variable holding the subscription token.
    pub api_key_env: String,
    /// Appended to queries that do not already contain it.
    pub site_hint: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            count: DEFAULT_COUNT,
            api_key_env: "BRAVE_API_KEY".into(),
            site_hint: "食べログ".into(),
            timeout_seconds: 10,
        }
    }
}

/// Scoring service settings (OpenAI-compatible chat completions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// API base URL, without the `/v1/...` path.
    pub base_url: String,
    /// Chat model name.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// System prompt asking for a `{"score": n}` reply.
    pub system_prompt: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            model: "gpt-3.5-turbo".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            timeout_seconds: 30,
        }
    }
}

/// Which name is recorded as a trend's top name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopNamePolicy {
    /// All names joined with `"; "`.
    #[default]
    Joined,
    /// Only the first name.
    First,
}

/// Trend store settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// SQLite database file. Defaults to [`default_database_path`].
    pub database_path: Option<PathBuf>,
    /// Top-name derivation.
    pub top_name: TopNamePolicy,
}

impl StoreSettings {
    /// The database path to open.
    pub fn resolved_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// One topic to track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    /// Entity the topic belongs to, e.g. a site or brand.
    pub entity_name: String,
    /// Entity category, e.g. `restaurant`.
    #[serde(default = "default_entity_kind")]
    pub entity_kind: String,
    /// Topic text used as the search query.
    pub topic: String,
}

impl TopicSpec {
    /// Convenience constructor.
    pub fn new(
        entity_name: impl Into<String>,
        entity_kind: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            entity_kind: entity_kind.into(),
            topic: topic.into(),
        }
    }
}

impl Default for TopicSpec {
    fn default() -> Self {
        Self::new("食べログ", default_entity_kind(), "西日暮里")
    }
}

fn default_entity_kind() -> String {
    "restaurant".into()
}

impl ScoutConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ScoutError::Config(e.to_string()))
    }

    /// Load `path` if given, otherwise the default config file if it
    /// exists, otherwise the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let default_path = Self::default_config_path();
        if default_path.exists() {
            tracing::debug!(path = %default_path.display(), "loading default config file");
            Self::from_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ScoutError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/trend-scout/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("trend-scout").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("trend-scout")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/trend-scout-config/config.toml")
        }
    }

    /// The configured topics, or the default topic when none are listed.
    pub fn effective_topics(&self) -> Vec<TopicSpec> {
        if self.topics.is_empty() {
            vec![TopicSpec::default()]
        } else {
            self.topics.clone()
        }
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Config`] naming the first invalid field, or the
    /// extraction error for an invalid `[extract]` section.
    pub fn validate(&self) -> Result<()> {
        self.extract.validate()?;
        if self.search.endpoint.trim().is_empty() {
            return Err(ScoutError::Config("search.endpoint must not be empty".into()));
        }
        if self.search.count == 0 {
            return Err(ScoutError::Config(
                "search.count must be greater than 0".into(),
            ));
        }
        if self.search.timeout_seconds == 0 {
            return Err(ScoutError::Config(
                "search.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.scoring.model.trim().is_empty() {
            return Err(ScoutError::Config("scoring.model must not be empty".into()));
        }
        if self.scoring.timeout_seconds == 0 {
            return Err(ScoutError::Config(
                "scoring.timeout_seconds must be greater than 0".into(),
            ));
        }
        if let Some(topic) = self.topics.iter().find(|t| t.topic.trim().is_empty()) {
            return Err(ScoutError::Config(format!(
                "topic for entity {:?} must not be empty",
                topic.entity_name
            )));
        }
        Ok(())
    }
}

/// Returns the default database path: `~/.local/share/trend-scout/trends.db`.
pub fn default_database_path() -> PathBuf {
    if let Some(data) = std::env::var_os("XDG_DATA_HOME") {
        PathBuf::from(data).join("trend-scout").join("trends.db")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("trend-scout")
            .join("trends.db")
    } else {
        PathBuf::from("/tmp/trend-scout-data/trends.db")
    }
}

/// API keys read from the environment at the process boundary.
#[derive(Clone)]
pub struct Credentials {
    /// Brave subscription token.
    pub brave_api_key: String,
    /// Scoring service API key.
    pub openai_api_key: String,
}

impl Credentials {
    /// Read both keys from the environment variables named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Credentials`] naming the first missing variable.
    pub fn from_env(config: &ScoutConfig) -> Result<Self> {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    /// Like [`Credentials::from_env`] with a custom variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Credentials`] naming the first missing variable.
    pub fn from_lookup(
        config: &ScoutConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let read = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ScoutError::Credentials(format!("{name} is not set")))
        };
        Ok(Self {
            brave_api_key: read(&config.search.api_key_env)?,
            openai_api_key: read(&config.scoring.api_key_env)?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("brave_api_key", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .finish()
    }
}
