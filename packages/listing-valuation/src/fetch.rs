//! Page fetching over HTTP.

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::error::{CrawlError, CrawlResult};
use crate::types::{config::CrawlConfig, Page};

/// Fetches marketplace pages (index and listings).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a single page by URL.
    async fn fetch(&self, url: &Url) -> CrawlResult<Page>;
}

/// HTTP fetcher backed by a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher using the timeout and user agent from `config`.
    pub fn new(config: &CrawlConfig) -> CrawlResult<Self> {
        let client = client_builder(config)
            .build()
            .map_err(|source| CrawlError::Http {
                url: config.index_url.clone(),
                source,
            })?;

        Ok(Self { client })
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

/// Client settings shared by every page fetch.
pub(crate) fn client_builder(config: &CrawlConfig) -> reqwest::ClientBuilder {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );

    reqwest::Client::builder()
        .timeout(config.page_timeout())
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(5))
}

fn request_error(url: &Url, e: reqwest::Error) -> CrawlError {
    if e.is_timeout() {
        CrawlError::Timeout { url: url.to_string() }
    } else {
        CrawlError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> CrawlResult<Page> {
        debug!(url = %url, "Visiting");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "HTTP request failed");
            request_error(url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Capture final URL after redirects
        let final_url = response.url().clone();

        let html = response.text().await.map_err(|e| {
            warn!(url = %url, error = %e, "Reading page body failed");
            request_error(url, e)
        })?;

        debug!(url = %final_url, content_length = html.len(), "Page fetched");
        Ok(Page::new(final_url, html))
    }
}

/// Parse a configured URL string, mapping failure into a crawl error.
pub fn parse_url(raw: &str) -> CrawlResult<Url> {
    Url::parse(raw).map_err(|_| CrawlError::InvalidUrl { url: raw.to_string() })
}
