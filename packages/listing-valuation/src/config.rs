use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::types::config::{CrawlConfig, ValuationConfig, DEFAULT_INDEX_URL, DEFAULT_VALUATION_BASE_URL};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub crawl: CrawlConfig,
    pub valuation: ValuationConfig,
    pub output_path: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut crawl = CrawlConfig::new(
            lookup("INDEX_URL").unwrap_or_else(|| DEFAULT_INDEX_URL.to_string()),
        );
        if let Some(concurrency) = positive_var(&lookup, "CRAWL_CONCURRENCY")? {
            crawl = crawl.with_concurrency(concurrency);
        }
        if let Some(max) = parse_var(&lookup, "MAX_LISTINGS")? {
            crawl = crawl.with_max_listings(max);
        }
        if let Some(secs) = positive_var(&lookup, "PAGE_TIMEOUT_SECS")? {
            crawl = crawl.with_page_timeout_secs(secs);
        }
        if let Some(selector) = lookup("LINK_SELECTOR") {
            crawl = crawl.with_link_selector(selector);
        }
        if let Some(selector) = lookup("PRICE_SELECTOR") {
            crawl = crawl.with_price_selector(selector);
        }
        if let Some(selector) = lookup("PLATE_SELECTOR") {
            crawl = crawl.with_plate_selector(selector);
        }

        let mut valuation = ValuationConfig::new(
            lookup("VALUATION_BASE_URL").unwrap_or_else(|| DEFAULT_VALUATION_BASE_URL.to_string()),
        );
        if let Some(secs) = positive_var(&lookup, "VALUATION_TIMEOUT_SECS")? {
            valuation = valuation.with_timeout_secs(secs);
        }
        if let Some(user_agent) = lookup("VALUATION_USER_AGENT") {
            valuation = valuation.with_user_agent(user_agent);
        }

        Ok(Self {
            crawl,
            valuation,
            output_path: lookup("OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("result.csv")),
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

/// Like [`parse_var`], but zero is rejected too.
fn positive_var<T: FromStr + Default + PartialEq>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match parse_var::<T>(lookup, name)? {
        Some(value) if value == T::default() => Err(ConfigError::Invalid {
            name,
            value: lookup(name).unwrap_or_default(),
        }),
        parsed => Ok(parsed),
    }
}
