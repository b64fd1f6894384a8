//! Error types for the trend-scout batch.

use scout_extract::ExtractError;

/// Top-level error type for a trend discovery run.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// A required credential is missing.
    #[error("credentials error: {0}")]
    Credentials(String),

    /// The search provider failed.
    #[error("search error: {0}")]
    Search(String),

    /// The scoring service failed or returned an unusable reply.
    #[error("scoring error: {0}")]
    Scoring(String),

    /// Trend store error.
    #[error("store error: {0}")]
    Store(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Extraction setup error.
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl From<rusqlite::Error> for ScoutError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ScoutError>;
