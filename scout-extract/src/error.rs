//! Error types for the scout-extract crate.
//!
//! Only collaborator and setup failures are errors. Rejected names, skipped
//! links and empty candidate lists are ordinary outcomes and never surface
//! here. No API keys appear in error messages.

/// Errors that can occur while fetching, parsing or configuring extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// An HTTP request to a page or the search API failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A response body could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid extraction configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A lexicon table could not be loaded or compiled.
    #[error("lexicon error: {0}")]
    Lexicon(String),
}

/// Convenience type alias for scout-extract results.
pub type Result<T> = std::result::Result<T, ExtractError>;
