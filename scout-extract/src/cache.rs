//! In-memory TTL cache for fetched pages.
//!
//! The same roundup or listing page often shows up several times in one
//! result list, and across the queries of a batch. [`PageCache`] keeps the
//! fetched HTML keyed by its [`CandidateKey`] so a repeat costs no request.
//! Each cache belongs to one fetcher; there is no process-wide instance.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use url::Url;

use crate::types::CandidateKey;

/// Maximum number of cached pages.
const MAX_CACHED_PAGES: u64 = 256;

/// Bounded, expiring page cache.
#[derive(Clone)]
pub struct PageCache {
    pages: Cache<CandidateKey, Arc<str>>,
}

impl PageCache {
    /// Create a cache whose entries expire after `ttl_seconds`.
    ///
    /// Returns `None` when `ttl_seconds` is 0, meaning caching is disabled.
    pub fn new(ttl_seconds: u64) -> Option<Self> {
        if ttl_seconds == 0 {
            return None;
        }
        let pages = Cache::builder()
            .max_capacity(MAX_CACHED_PAGES)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();
        Some(Self { pages })
    }

    /// Look up a cached page body.
    pub async fn get(&self, url: &Url) -> Option<Arc<str>> {
        self.pages.get(&CandidateKey::from_url(url)).await
    }

    /// Store a page body.
    pub async fn insert(&self, url: &Url, body: Arc<str>) {
        self.pages.insert(CandidateKey::from_url(url), body).await;
    }
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("entries", &self.pages.entry_count())
            .finish()
    }
}
