//! Result aggregation: from a ranked search-result list to at most
//! `max_candidates` distinct names.
//!
//! [`CandidateFinder::candidates`] is a lazy stream over at most
//! `scan_budget` result items. [`CandidateFinder::aggregate`] takes
//! `max_candidates` items from it, so once the cap is reached no further
//! result items are inspected and no further pages are fetched.
//!
//! Hub and listing pages may be fetched ahead of the item being processed
//! (`fetch_concurrency > 1`), but results are always consumed in original
//! item order and the seen-set is only touched in that order, so the output
//! is identical to a sequential run.

use std::pin::pin;

use async_stream::stream;
use futures::stream::{self, Stream, StreamExt};
use url::Url;

use crate::classify::UrlClassifier;
use crate::config::ExtractConfig;
use crate::error::Result;
use crate::extract::{LinkExtractor, SelectorSet};
use crate::fetch::PageFetcher;
use crate::lexicon::Lexicon;
use crate::normalize::NameNormalizer;
use crate::types::{AggregationResult, Candidate, CandidateKey, PageKind, SearchResultItem, SeenSet};

/// What to do with one search-result item, decided from its URL alone.
enum Step<'a> {
    Skip,
    Detail { item: &'a SearchResultItem, url: Url },
    Page { kind: PageKind, url: Url },
}

/// Turns search results into an ordered, deduplicated list of names.
#[derive(Debug, Clone)]
pub struct CandidateFinder {
    classifier: UrlClassifier,
    normalizer: NameNormalizer,
    hub: LinkExtractor,
    listing: LinkExtractor,
    config: ExtractConfig,
}

impl CandidateFinder {
    /// Build a finder from a lexicon and extraction settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExtractError::Config`] if `config` is invalid and
    /// [`crate::ExtractError::Lexicon`] if a lexicon table fails to compile.
    pub fn new(lexicon: &Lexicon, config: ExtractConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: UrlClassifier::new(&lexicon.site)?,
            normalizer: NameNormalizer::new(&lexicon.names)?,
            hub: LinkExtractor::new(SelectorSet::new(
                PageKind::HubSummaryPage,
                &lexicon.selectors.hub,
            )?),
            listing: LinkExtractor::new(SelectorSet::new(
                PageKind::ListingPage,
                &lexicon.selectors.listing,
            )?),
            config,
        })
    }

    /// Build a finder using the lexicon named by `config.lexicon_path`, or
    /// the built-in one.
    ///
    /// # Errors
    ///
    /// See [`CandidateFinder::new`] and [`Lexicon::load`].
    pub fn from_config(config: ExtractConfig) -> Result<Self> {
        let lexicon = Lexicon::load(config.lexicon_path.as_deref())?;
        Self::new(&lexicon, config)
    }

    /// The extraction settings in use.
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// The URL classifier in use.
    pub fn classifier(&self) -> &UrlClassifier {
        &self.classifier
    }

    /// The name normalizer in use.
    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    /// Lazily discover candidates from `results`, in order.
    ///
    /// At most `scan_budget` items are inspected. Every yielded candidate
    /// has a distinct key. The stream owns its own [`SeenSet`], so two
    /// streams never share dedup state.
    pub fn candidates<'a, F: PageFetcher>(
        &'a self,
        results: &'a [SearchResultItem],
        fetcher: &'a F,
    ) -> impl Stream<Item = Candidate> + 'a {
        stream! {
            let mut seen = SeenSet::new();

            let steps = stream::iter(results.iter().take(self.config.scan_budget))
                .map(move |item| async move {
                    let step = self.plan(item);
                    let page = match &step {
                        Step::Page { url, .. } => Some(fetcher.fetch(url).await),
                        _ => None,
                    };
                    (step, page)
                })
                .buffered(self.config.fetch_concurrency);
            let mut steps = pin!(steps);

            while let Some((step, page)) = steps.next().await {
                match step {
                    Step::Skip => {}
                    Step::Detail { item, url } => {
                        let key = CandidateKey::from_url(&url);
                        if seen.contains(&key) {
                            tracing::debug!(%key, "duplicate result skipped");
                            continue;
                        }
                        let Some(name) = self.normalizer.normalize(&item.title) else {
                            tracing::debug!(%key, "detail page title rejected");
                            continue;
                        };
                        seen.insert(key.clone());
                        tracing::debug!(%key, name = %name, "detail page admitted");
                        yield Candidate { name, key, origin: PageKind::DetailPage };
                    }
                    Step::Page { kind, url } => {
                        let html = match page {
                            Some(Ok(html)) => html,
                            Some(Err(e)) => {
                                tracing::warn!(%url, %kind, error = %e, "page fetch failed, skipping");
                                continue;
                            }
                            None => continue,
                        };
                        let extractor = match kind {
                            PageKind::HubSummaryPage => &self.hub,
                            _ => &self.listing,
                        };
                        let found = extractor.extract(
                            &html,
                            &url,
                            &self.classifier,
                            &self.normalizer,
                            &mut seen,
                        );
                        for candidate in found {
                            yield candidate;
                        }
                    }
                }
            }
        }
    }

    /// Collect at most `max_candidates` names for `query` from `results`.
    ///
    /// An empty result is an ordinary outcome. Page-level failures are
    /// logged and skipped.
    pub async fn aggregate<F: PageFetcher>(
        &self,
        query: &str,
        results: &[SearchResultItem],
        fetcher: &F,
    ) -> AggregationResult {
        tracing::trace!(query, results = results.len(), "aggregating candidates");

        let names: Vec<String> = self
            .candidates(results, fetcher)
            .take(self.config.max_candidates)
            .map(|candidate| candidate.name)
            .collect()
            .await;

        let result = AggregationResult::from_names(names);
        tracing::debug!(
            query,
            count = result.ordered_names.len(),
            joined = %result.joined_text,
            "aggregation finished"
        );
        result
    }

    fn plan<'a>(&self, item: &'a SearchResultItem) -> Step<'a> {
        let url = match Url::parse(&item.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(url = %item.url, error = %e, "unparseable result URL skipped");
                return Step::Skip;
            }
        };
        if !self.classifier.is_target_host(&url) {
            tracing::trace!(%url, "off-site result skipped");
            return Step::Skip;
        }
        match self.classifier.classify(&url) {
            PageKind::DetailPage => Step::Detail { item, url },
            kind @ (PageKind::HubSummaryPage | PageKind::ListingPage) => Step::Page { kind, url },
            PageKind::Irrelevant => Step::Skip,
        }
    }
}
