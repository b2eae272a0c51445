//! Vehicle Listing Valuation
//!
//! Crawls a marketplace index page, visits every listing on it, reads the
//! listed price and registration plate, asks a registry and a valuation
//! service what the vehicle is worth, and exports the price differential
//! per listing as CSV.
//!
//! # Usage
//!
//! ```rust,ignore
//! use listing_valuation::{export, BilprisClient, CrawlConfig, Crawler, HttpFetcher, ValuationConfig};
//!
//! let config = CrawlConfig::new("https://www.blocket.se/goteborg/bilar");
//! let fetcher = HttpFetcher::new(&config)?;
//! let valuation = BilprisClient::new(&ValuationConfig::default())?;
//!
//! let crawler = Crawler::new(config, fetcher, valuation)?;
//! crawler.run().await?;
//! export::export_csv("result.csv", &crawler.store().snapshot())?;
//! ```
//!
//! # Modules
//!
//! - [`crawler`] - Orchestration and per-listing key threading
//! - [`store`] - Write-once correlation store
//! - [`valuation`] - Registry and valuation lookups
//! - [`pricing`] - Price differential
//! - [`export`] - CSV export
//! - [`testing`] - Mock fetcher and valuation API

pub mod config;
pub mod crawler;
pub mod error;
pub mod events;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod parse;
pub mod pricing;
pub mod store;
pub mod testing;
pub mod types;
pub mod valuation;

// Re-export core types at crate root
pub use config::AppConfig;
pub use crawler::{CrawlSummary, Crawler, ListingVisit};
pub use error::{
    ConfigError, CorrelationError, CrawlError, ExportError, PriceError, ValuationError,
};
pub use events::CrawlEvent;
pub use fetch::{HttpFetcher, PageFetcher};
pub use store::CorrelationStore;
pub use types::{
    config::{CrawlConfig, ValuationConfig},
    KeySequence, ListingKey, ListingRecord, Page, RecordField, RecordUpdate, VehicleInfo,
};
pub use valuation::{BilprisClient, Enrichment, ValuationApi};
