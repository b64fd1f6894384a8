//! Core types shared by the classifier, extractor and aggregator.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Separator used to join candidate names into the scoring text.
pub const JOIN_SEPARATOR: &str = "; ";

/// A single item returned by a search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultItem {
    /// Title of the result page as reported by the provider.
    pub title: String,
    /// URL of the result page. Not guaranteed to parse.
    pub url: String,
}

impl SearchResultItem {
    /// Convenience constructor.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// What kind of page a URL points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageKind {
    /// A page describing exactly one entity.
    DetailPage,
    /// A curated roundup article linking to several entities.
    HubSummaryPage,
    /// A search-results style listing linking to several entities.
    ListingPage,
    /// Anything else, including other hosts and translated pages.
    Irrelevant,
}

impl PageKind {
    /// Returns a short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DetailPage => "detail",
            Self::HubSummaryPage => "hub",
            Self::ListingPage => "listing",
            Self::Irrelevant => "irrelevant",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Deduplication identity of a discovered entity: the serialized URL
/// without query or fragment, with a single trailing `/` removed.
///
/// Tracking parameters and in-page anchors point at the same entity, so
/// `/13000001/?lid=matome` and `/13000001/#rstdtl-top` share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateKey(String);

impl CandidateKey {
    /// Build the key for a parsed URL.
    pub fn from_url(url: &Url) -> Self {
        let mut bare = url.clone();
        bare.set_query(None);
        bare.set_fragment(None);
        let raw = bare.as_str();
        let trimmed = raw.strip_suffix('/').unwrap_or(raw);
        Self(trimmed.to_owned())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keys admitted during one aggregation run.
///
/// Created at the start of a run and handed by `&mut` to every extraction
/// branch, so a URL admitted through one branch is never admitted again
/// through another.
#[derive(Debug, Default, Clone)]
pub struct SeenSet {
    keys: HashSet<CandidateKey>,
}

impl SeenSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `key` was already admitted.
    pub fn contains(&self, key: &CandidateKey) -> bool {
        self.keys.contains(key)
    }

    /// Admit `key`. Returns `false` if it was already present.
    pub fn insert(&mut self, key: CandidateKey) -> bool {
        self.keys.insert(key)
    }

    /// Number of admitted keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if nothing has been admitted yet.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// One admitted candidate name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Normalized entity name. Never empty.
    pub name: String,
    /// Deduplication key of the entity's detail page.
    pub key: CandidateKey,
    /// Kind of page the candidate was discovered on.
    pub origin: PageKind,
}

/// Final output of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Names in first-discovery order, capped at `max_candidates`.
    pub ordered_names: Vec<String>,
    /// `ordered_names` joined with [`JOIN_SEPARATOR`]; the scoring input.
    pub joined_text: String,
}

impl AggregationResult {
    /// Build a result from names in discovery order.
    pub fn from_names(ordered_names: Vec<String>) -> Self {
        let joined_text = ordered_names.join(JOIN_SEPARATOR);
        Self {
            ordered_names,
            joined_text,
        }
    }

    /// Returns `true` when the run found no candidates.
    pub fn is_empty(&self) -> bool {
        self.ordered_names.is_empty()
    }

    /// The first discovered name, if any.
    pub fn first_name(&self) -> Option<&str> {
        self.ordered_names.first().map(String::as_str)
    }
}
