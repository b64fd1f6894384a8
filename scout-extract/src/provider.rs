//! Trait definition for pluggable search providers.
//!
//! A provider turns a query into an ordered list of [`SearchResultItem`]s.
//! The aggregator never talks to a search API directly, so tests and
//! alternative backends only need to implement [`SearchProvider`].

use crate::error::ExtractError;
use crate::types::SearchResultItem;

/// A pluggable web search backend.
///
/// Implementors handle their own:
///
/// - request construction and query encoding
/// - authentication
/// - response parsing into [`SearchResultItem`] values, in provider order
///
/// All implementations must be `Send + Sync` so one provider can serve a
/// whole batch of topics.
pub trait SearchProvider: Send + Sync {
    /// Run `query` and return the result items in ranking order.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if the request fails or the response cannot
    /// be parsed. An empty result list is not an error.
    fn search(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<Vec<SearchResultItem>, ExtractError>> + Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
