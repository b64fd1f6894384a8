//! Curated word lists and patterns, loaded as data.
//!
//! The classifier's path exclusions, the extractor's CSS selectors and the
//! normalizer's stoplists are all tables in a TOML lexicon. The built-in
//! lexicon is embedded from `data/lexicon.toml`; a replacement file can be
//! supplied through [`ExtractConfig::lexicon_path`](crate::ExtractConfig).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

/// The embedded default lexicon.
const BUILTIN_LEXICON: &str = include_str!("../data/lexicon.toml");

/// All curated tables used by the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    /// Target site description used by the URL classifier.
    pub site: SiteRules,
    /// Anchor selectors for the two extraction variants.
    pub selectors: SelectorTables,
    /// Tables used by the name normalizer.
    pub names: NameRules,
}

/// Target site rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRules {
    /// The single domain candidates are drawn from. Subdomains also match.
    pub domain: String,
    /// First path segments marking a translated variant of the site.
    pub locale_prefixes: Vec<String>,
    /// Path fragment identifying a roundup/summary page.
    pub hub_segment: String,
    /// Path fragment identifying a search-results listing page.
    pub listing_segment: String,
    /// Regex a detail-page path must match in full.
    pub detail_pattern: String,
    /// Regexes for paths that are never entity pages.
    pub excluded_paths: Vec<String>,
}

/// CSS selector groups, one per extraction variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorTables {
    /// Anchors linking to entities on hub-summary pages.
    pub hub: Vec<String>,
    /// Anchors linking to entities on listing pages.
    pub listing: Vec<String>,
}

/// Name-cleaning tables, listed in the order the stages use them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameRules {
    /// Branding separators, in priority order.
    pub separators: Vec<String>,
    /// Honorific suffixes stripped from the end of a name.
    pub honorifics: Vec<String>,
    /// `[open, close]` bracket pairs whose contents are removed.
    pub brackets: Vec<[String; 2]>,
    /// Literal reviewer handles removed wherever they occur.
    pub reviewer_handles: Vec<String>,
    /// Regex for handle-shaped tokens not on the explicit list.
    pub handle_pattern: String,
    /// Regexes for generic marketing phrases.
    pub marketing_patterns: Vec<String>,
    /// Literal decorative strings removed during final cleanup.
    pub decorations: Vec<String>,
}

impl Lexicon {
    /// The embedded default lexicon.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Lexicon`] only if the embedded file is malformed.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_LEXICON)
    }

    /// Parse a lexicon from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Lexicon`] if the text is not a valid lexicon.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let lexicon: Self =
            toml::from_str(content).map_err(|e| ExtractError::Lexicon(e.to_string()))?;
        lexicon.validate()?;
        Ok(lexicon)
    }

    /// Load a lexicon from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Lexicon`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::Lexicon(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if given, otherwise the built-in lexicon.
    ///
    /// # Errors
    ///
    /// Same as [`Lexicon::from_file`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.site.domain.trim().is_empty() {
            return Err(ExtractError::Lexicon("site.domain must not be empty".into()));
        }
        if self.selectors.hub.is_empty() || self.selectors.listing.is_empty() {
            return Err(ExtractError::Lexicon(
                "selectors.hub and selectors.listing must not be empty".into(),
            ));
        }
        if self.names.brackets.iter().flatten().any(String::is_empty) {
            return Err(ExtractError::Lexicon(
                "names.brackets entries must not be empty".into(),
            ));
        }
        Ok(())
    }
}
