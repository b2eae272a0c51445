//! Configuration types for crawling and valuation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Index page searched when no other URL is configured.
pub const DEFAULT_INDEX_URL: &str = "https://www.blocket.se/hela_sverige?q=d4&cg=1020&w=3&st=s&ps=3&pe=19&mys=2014&mye=2015&ms=&me=26&cxpf=8&cxpt=&fu=&pl=&gb=&ca=15&is=1&l=0&md=th&sp=1&cb=41";

/// Valuation API root used when no other base URL is configured.
pub const DEFAULT_VALUATION_BASE_URL: &str = "https://www.bilpriser.se/api/";

/// Configuration for crawl operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Marketplace index page listing the vehicles
    pub index_url: String,

    /// CSS selector for listing links on the index page
    pub link_selector: String,

    /// CSS selector for the price fragment on a listing page
    pub price_selector: String,

    /// CSS selector for the fragment the plate is read from
    pub plate_selector: String,

    /// Listing pages visited at the same time
    pub concurrency: usize,

    /// Stop after this many discovered listings (None = all)
    pub max_listings: Option<usize>,

    /// Timeout for a single page fetch, in seconds
    pub page_timeout_secs: u64,

    /// User agent sent with page fetches
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            link_selector: "a.item-link".to_string(),
            price_selector: "p.list_price".to_string(),
            plate_selector: "aside.body_aside".to_string(),
            concurrency: 4,
            max_listings: None,
            page_timeout_secs: 15,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

impl CrawlConfig {
    /// Create a new crawl config for an index URL.
    pub fn new(index_url: impl Into<String>) -> Self {
        Self {
            index_url: index_url.into(),
            ..Default::default()
        }
    }

    /// Set how many listing pages are visited concurrently (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Cap the number of listings taken from the index page.
    pub fn with_max_listings(mut self, max: usize) -> Self {
        self.max_listings = Some(max);
        self
    }

    /// Override the listing link selector.
    pub fn with_link_selector(mut self, selector: impl Into<String>) -> Self {
        self.link_selector = selector.into();
        self
    }

    /// Override the price selector.
    pub fn with_price_selector(mut self, selector: impl Into<String>) -> Self {
        self.price_selector = selector.into();
        self
    }

    /// Override the plate fragment selector.
    pub fn with_plate_selector(mut self, selector: impl Into<String>) -> Self {
        self.plate_selector = selector.into();
        self
    }

    /// Set the page fetch timeout.
    pub fn with_page_timeout_secs(mut self, secs: u64) -> Self {
        self.page_timeout_secs = secs;
        self
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

/// Configuration for the registry and valuation lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// API root; both lookups are query strings on this URL
    pub base_url: String,

    /// Per-request timeout, in seconds
    pub timeout_secs: u64,

    /// User agent sent with every lookup
    pub user_agent: String,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_VALUATION_BASE_URL.to_string(),
            timeout_secs: 2,
            user_agent: "Test".to_string(),
        }
    }
}

impl ValuationConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
