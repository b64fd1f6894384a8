//! Page fetching: the [`PageFetcher`] seam and its HTTP implementation.
//!
//! The extraction core only needs "URL in, HTML out". Any failure,
//! including a timeout, is reported as an error and the caller skips the
//! page.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use url::Url;

use crate::cache::PageCache;
use crate::config::ExtractConfig;
use crate::error::ExtractError;

/// Browser identities offered to the review site when no User-Agent is
/// configured.
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36 Edg/129.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:131.0) Gecko/20100101 Firefox/131.0",
];

/// Japanese first, so hub and listing pages come back untranslated.
const PAGE_ACCEPT_LANGUAGE: &str = "ja,en-US;q=0.8,en;q=0.6";

const PAGE_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

/// Fetches raw HTML for a page.
///
/// Implementations apply their own timeouts and retries. All
/// implementations must be `Send + Sync` so one fetcher can serve
/// concurrent page requests.
pub trait PageFetcher: Send + Sync {
    /// Fetch the body of `url` as text.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if the page cannot be retrieved.
    fn fetch(
        &self,
        url: &Url,
    ) -> impl std::future::Future<Output = Result<String, ExtractError>> + Send;
}

impl<T: PageFetcher> PageFetcher for &T {
    fn fetch(
        &self,
        url: &Url,
    ) -> impl std::future::Future<Output = Result<String, ExtractError>> + Send {
        (**self).fetch(url)
    }
}

/// [`PageFetcher`] backed by `reqwest`, with an optional page cache.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    cache: Option<PageCache>,
}

impl HttpFetcher {
    /// Build a fetcher from extraction settings.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ExtractConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            client: page_client(config)?,
            cache: PageCache::new(config.page_cache_ttl_seconds),
        })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, ExtractError> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url).await {
                tracing::trace!(%url, "page cache hit");
                return Ok(body.to_string());
            }
        }

        tracing::trace!(%url, "fetching page");
        let body = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ExtractError::Http(format!("request to {url} failed: {e}")))?
            .error_for_status()
            .map_err(|e| ExtractError::Http(format!("{url} returned an error status: {e}")))?
            .text()
            .await
            .map_err(|e| ExtractError::Http(format!("reading {url} failed: {e}")))?;

        tracing::trace!(%url, bytes = body.len(), "page fetched");
        if let Some(cache) = &self.cache {
            cache.insert(url, Arc::from(body.as_str())).await;
        }
        Ok(body)
    }
}

/// Client for review-site pages. Cookies persist for the fetcher's lifetime
/// and at most 10 redirects are followed.
fn page_client(config: &ExtractConfig) -> Result<reqwest::Client, ExtractError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(PAGE_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(PAGE_ACCEPT_LANGUAGE));

    reqwest::Client::builder()
        .default_headers(headers)
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(user_agent_for(config))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| ExtractError::Http(format!("cannot build page client: {e}")))
}

/// The configured User-Agent, or a browser identity picked at random.
pub fn user_agent_for(config: &ExtractConfig) -> String {
    if let Some(custom) = config.user_agent.as_deref().filter(|ua| !ua.trim().is_empty()) {
        return custom.to_owned();
    }
    BROWSER_USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(BROWSER_USER_AGENTS[0])
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn uncached() -> ExtractConfig {
        ExtractConfig {
            page_cache_ttl_seconds: 0,
            timeout_seconds: 5,
            ..Default::default()
        }
    }

    #[test]
    fn configured_user_agent_wins() {
        let config = ExtractConfig {
            user_agent: Some("TrendScout/1.0".into()),
            ..Default::default()
        };
        assert_eq!(user_agent_for(&config), "TrendScout/1.0");
    }

    #[test]
    fn blank_user_agent_falls_back_to_browser_list() {
        let config = ExtractConfig {
            user_agent: Some("  ".into()),
            ..Default::default()
        };
        let ua = user_agent_for(&config);
        assert!(BROWSER_USER_AGENTS.contains(&ua.as_str()));
        assert!(BROWSER_USER_AGENTS.contains(&user_agent_for(&ExtractConfig::default()).as_str()));
    }

    #[tokio::test]
    async fn page_requests_ask_for_japanese_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rstLst/ramen/"))
            .and(|req: &Request| {
                let value = |name: &str| req.headers.get(name).and_then(|v| v.to_str().ok());
                value("accept-language") == Some(PAGE_ACCEPT_LANGUAGE)
                    && value("accept") == Some(PAGE_ACCEPT)
            })
            .and(header("user-agent", "TrendScout/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>一覧</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let config = ExtractConfig {
            user_agent: Some("TrendScout/1.0".into()),
            ..uncached()
        };
        let fetcher = HttpFetcher::new(&config).expect("fetcher");
        let url = Url::parse(&format!("{}/rstLst/ramen/", server.uri())).expect("url");
        assert_eq!(fetcher.fetch(&url).await.expect("fetch"), "<html>一覧</html>");
    }

    #[test]
    fn fetcher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpFetcher>();
    }

    #[tokio::test]
    async fn fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/matome/1/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&uncached()).expect("fetcher");
        let url = Url::parse(&format!("{}/matome/1/", server.uri())).expect("url");
        let body = fetcher.fetch(&url).await.expect("fetch");
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn error_status_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&uncached()).expect("fetcher");
        let url = Url::parse(&format!("{}/matome/1/", server.uri())).expect("url");
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(err.to_string().starts_with("HTTP error"));
    }

    #[tokio::test]
    async fn cached_pages_are_fetched_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/matome/2/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("cached"))
            .expect(1)
            .mount(&server)
            .await;

        let config = ExtractConfig {
            page_cache_ttl_seconds: 60,
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(&config).expect("fetcher");
        let url = Url::parse(&format!("{}/matome/2/", server.uri())).expect("url");
        assert_eq!(fetcher.fetch(&url).await.expect("first"), "cached");
        assert_eq!(fetcher.fetch(&url).await.expect("second"), "cached");
    }
}
