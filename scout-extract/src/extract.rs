//! Entity-link extraction from hub and listing pages.
//!
//! One routine serves both page types; only the anchor selector group
//! differs. Each matched anchor is resolved, classified, deduplicated
//! against the run's [`SeenSet`] and normalized before it is admitted.

use scraper::{Html, Selector};
use url::Url;

use crate::classify::UrlClassifier;
use crate::error::{ExtractError, Result};
use crate::fetch::PageFetcher;
use crate::normalize::NameNormalizer;
use crate::types::{Candidate, CandidateKey, PageKind, SeenSet};

/// A compiled anchor selector group for one page type.
#[derive(Debug, Clone)]
pub struct SelectorSet {
    page_kind: PageKind,
    selector: Selector,
}

impl SelectorSet {
    /// Compile a selector group from individual CSS selectors.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Lexicon`] if the combined selector is invalid.
    pub fn new(page_kind: PageKind, selectors: &[String]) -> Result<Self> {
        let group = selectors.join(", ");
        let selector = Selector::parse(&group).map_err(|e| {
            ExtractError::Lexicon(format!("invalid {page_kind} selector {group:?}: {e:?}"))
        })?;
        Ok(Self {
            page_kind,
            selector,
        })
    }

    /// The page type this selector group applies to.
    pub fn page_kind(&self) -> PageKind {
        self.page_kind
    }
}

/// Extracts detail-page links and their names from fetched HTML.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    selectors: SelectorSet,
}

impl LinkExtractor {
    /// Create an extractor for the given selector group.
    pub fn new(selectors: SelectorSet) -> Self {
        Self { selectors }
    }

    /// The page type this extractor handles.
    pub fn page_kind(&self) -> PageKind {
        self.selectors.page_kind()
    }

    /// Extract admitted candidates from `html` in document order.
    ///
    /// Keys of admitted candidates are recorded in `seen`. An anchor whose
    /// text normalizes to nothing is skipped without being recorded, so a
    /// later anchor for the same URL can still supply a usable name.
    pub fn extract(
        &self,
        html: &str,
        base: &Url,
        classifier: &UrlClassifier,
        normalizer: &NameNormalizer,
        seen: &mut SeenSet,
    ) -> Vec<Candidate> {
        let document = Html::parse_document(html);
        let mut candidates = Vec::new();

        for anchor in document.select(&self.selectors.selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let resolved = match base.join(href) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(href, error = %e, "unresolvable href skipped");
                    continue;
                }
            };
            if classifier.classify(&resolved) != PageKind::DetailPage {
                continue;
            }

            let key = CandidateKey::from_url(&resolved);
            if seen.contains(&key) {
                tracing::debug!(%key, "duplicate link skipped");
                continue;
            }

            let text = anchor.text().collect::<String>();
            let Some(name) = normalizer.normalize(text.trim()) else {
                tracing::debug!(%key, text = text.trim(), "unusable anchor text skipped");
                continue;
            };

            seen.insert(key.clone());
            tracing::debug!(%key, name = %name, "link admitted");
            candidates.push(Candidate {
                name,
                key,
                origin: self.page_kind(),
            });
        }

        tracing::debug!(
            base = %base,
            kind = %self.page_kind(),
            count = candidates.len(),
            "links extracted"
        );
        candidates
    }

    /// Fetch `url` and extract candidates from it.
    ///
    /// A fetch failure is logged and yields no candidates; it never aborts
    /// the surrounding run.
    pub async fn fetch_and_extract<F: PageFetcher>(
        &self,
        fetcher: &F,
        url: &Url,
        classifier: &UrlClassifier,
        normalizer: &NameNormalizer,
        seen: &mut SeenSet,
    ) -> Vec<Candidate> {
        match fetcher.fetch(url).await {
            Ok(html) => self.extract(&html, url, classifier, normalizer, seen),
            Err(e) => {
                tracing::warn!(%url, error = %e, "page fetch failed, skipping");
                Vec::new()
            }
        }
    }
}
