//! Fetched page content.

use url::Url;

/// A marketplace page as returned by a [`crate::fetch::PageFetcher`].
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects; relative links resolve against it
    pub url: Url,

    /// Raw HTML body
    pub html: String,
}

impl Page {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }
}
