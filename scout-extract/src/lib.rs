//! # scout-extract
//!
//! Candidate entity-name extraction from noisy web search results.
//!
//! Given the ranked results of a search against a review site, this crate
//! decides which results point at single-entity pages, which point at
//! roundup or listing pages worth following, cleans the display names it
//! finds and returns a short, ordered, deduplicated list of names ready for
//! downstream scoring.
//!
//! ## Design
//!
//! - [`UrlClassifier`] sorts URLs into detail, hub, listing or irrelevant
//! - [`NameNormalizer`] strips branding, honorifics, annotations, reviewer
//!   handles and marketing phrases from titles
//! - [`LinkExtractor`] pulls detail links out of hub and listing pages
//! - [`CandidateFinder`] walks results lazily and stops at the cap
//! - Site rules and text tables live in a TOML [`Lexicon`], with a built-in
//!   default for tabelog.com
//! - Page fetching and searching sit behind the [`PageFetcher`] and
//!   [`SearchProvider`] traits
//!
//! ## Security
//!
//! - API keys never appear in `Debug` output or error messages
//! - Queries and raw titles are logged only at trace level

pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod lexicon;
pub mod normalize;
pub mod provider;
pub mod providers;
pub mod types;

pub use aggregate::CandidateFinder;
pub use classify::UrlClassifier;
pub use config::ExtractConfig;
pub use error::{ExtractError, Result};
pub use extract::{LinkExtractor, SelectorSet};
pub use fetch::{HttpFetcher, PageFetcher};
pub use lexicon::Lexicon;
pub use normalize::NameNormalizer;
pub use provider::SearchProvider;
pub use providers::{BraveConfig, BraveSearchProvider};
pub use types::{AggregationResult, Candidate, CandidateKey, PageKind, SearchResultItem, SeenSet};

/// Search for `query` and aggregate candidate names from the results.
///
/// # Errors
///
/// Returns the provider's error if the search itself fails. Failures while
/// fetching individual pages are logged and skipped.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> scout_extract::Result<()> {
/// use scout_extract::{BraveConfig, BraveSearchProvider, CandidateFinder, ExtractConfig, HttpFetcher};
///
/// let config = ExtractConfig::default();
/// let finder = CandidateFinder::from_config(config.clone())?;
/// let fetcher = HttpFetcher::new(&config)?;
/// let provider = BraveSearchProvider::new(BraveConfig::new("token"))?;
///
/// let result = scout_extract::collect_candidates("西日暮里 ラーメン 食べログ", &provider, &fetcher, &finder).await?;
/// println!("{}", result.joined_text);
/// # Ok(())
/// # }
/// ```
pub async fn collect_candidates<P, F>(
    query: &str,
    provider: &P,
    fetcher: &F,
    finder: &CandidateFinder,
) -> Result<AggregationResult>
where
    P: SearchProvider,
    F: PageFetcher,
{
    let results = provider.search(query).await?;
    tracing::debug!(provider = provider.name(), count = results.len(), "search returned");
    Ok(finder.aggregate(query, &results, fetcher).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    struct FixedProvider(Vec<SearchResultItem>);

    impl SearchProvider for FixedProvider {
        async fn search(&self, _query: &str) -> Result<Vec<SearchResultItem>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingProvider;

    impl SearchProvider for FailingProvider {
        async fn search(&self, _query: &str) -> Result<Vec<SearchResultItem>> {
            Err(ExtractError::Http("quota exceeded".into()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct NoPages;

    impl PageFetcher for NoPages {
        async fn fetch(&self, url: &Url) -> Result<String> {
            Err(ExtractError::Http(format!("offline: {url}")))
        }
    }

    fn finder() -> CandidateFinder {
        CandidateFinder::from_config(ExtractConfig::default()).expect("finder")
    }

    #[tokio::test]
    async fn collect_candidates_aggregates_provider_results() {
        let provider = FixedProvider(vec![SearchResultItem::new(
            "麦's Ramen | 食べログ",
            "https://tabelog.com/tokyo/A1311/A131105/13034566/",
        )]);
        let result = collect_candidates("q", &provider, &NoPages, &finder())
            .await
            .expect("collect");
        assert_eq!(result.joined_text, "麦's Ramen");
    }

    #[tokio::test]
    async fn empty_search_results_are_not_an_error() {
        let result = collect_candidates("q", &FixedProvider(Vec::new()), &NoPages, &finder())
            .await
            .expect("collect");
        assert!(result.is_empty());
        assert_eq!(result.joined_text, "");
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let err = collect_candidates("q", &FailingProvider, &NoPages, &finder())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }
}
