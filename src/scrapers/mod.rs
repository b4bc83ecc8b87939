//! Page fetching, feed indexing, and article field extraction.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing**: read the site's RSS feed and collect article URLs ([`feed`])
//! 2. **Extraction**: fetch each article page and pull its fields ([`article`])
//!
//! Both phases go through the [`Fetch`] trait so the network can be swapped
//! for canned pages in tests. Every CSS selector the extractor uses lives in
//! [`selectors`].

pub mod article;
pub mod feed;
pub mod selectors;

use reqwest::Client;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// User agent sent with every request. The target site rejects clients
/// without a browser-looking agent.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// A failed page fetch: transport error or non-2xx status.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Retrieve the body of a page as text.
///
/// Implementors perform exactly one attempt per call.
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// [`Fetch`] implementation backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client with the browser user agent.
    ///
    /// Without `timeout` the client's defaults apply (no overall deadline).
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.text().await
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("user_agent", &USER_AGENT)
            .finish()
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let res = self.get_text(url).await;
        let dt = t0.elapsed();

        match &res {
            Ok(body) => debug!(elapsed_ms = dt.as_millis() as u64, bytes = body.len(), "Fetched page"),
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "Page fetch failed"),
        }
        Ok(res?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies by URL and records every requested URL.
    /// Unknown URLs fail like a 404 would, through a real `reqwest::Error`.
    #[derive(Default)]
    pub struct FakeFetcher {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn with_page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl Fetch for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(body) => Ok(body.clone()),
                // Building a request for an unparseable URL yields a reqwest::Error.
                None => Err(FetchError::Http(
                    Client::new().get("not a url").build().unwrap_err(),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeFetcher;
    use super::*;

    #[test]
    fn test_http_fetcher_builds_with_and_without_timeout() {
        assert!(HttpFetcher::new(None).is_ok());
        assert!(HttpFetcher::new(Some(Duration::from_secs(5))).is_ok());
    }

    #[tokio::test]
    async fn test_fake_fetcher_serves_known_pages_and_fails_others() {
        let fetcher = FakeFetcher::default().with_page("https://site/a", "<html></html>");

        assert_eq!(fetcher.fetch("https://site/a").await.unwrap(), "<html></html>");
        assert!(fetcher.fetch("https://site/missing").await.is_err());
        assert_eq!(
            fetcher.requested(),
            vec!["https://site/a".to_string(), "https://site/missing".to_string()]
        );
    }
}
