//! Typed errors for the listing valuation pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell
//! recoverable per-listing failures apart from fatal ones.

use thiserror::Error;

use crate::types::{ListingKey, RecordField};

/// Errors that can occur while fetching marketplace pages.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTTP request failed
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request exceeded its timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Configured CSS selector does not parse
    #[error("invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },
}

/// Errors returned by the registry and valuation lookups.
///
/// All variants are recoverable: the affected record keeps its dependent
/// fields absent and the crawl continues.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// Transport-level failure
    #[error("valuation request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// Request exceeded the configured timeout
    #[error("valuation request timed out: {url}")]
    Timeout { url: String },

    /// Non-2xx response
    #[error("valuation service returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Body could not be decoded into the expected shape
    #[error("malformed valuation payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Payload decoded but a required value was empty
    #[error("valuation payload missing field: {0}")]
    MissingField(&'static str),

    /// Base URL could not be turned into a request URL
    #[error("invalid valuation URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ValuationError {
    /// Whether this failure was a timeout rather than a bad answer.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ValuationError::Timeout { .. })
    }
}

/// Errors computing the price differential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price is not numeric: {0:?}")]
    NotNumeric(String),

    #[error("price differential overflowed")]
    Overflow,
}

/// Correlation protocol violations reported by the store.
///
/// These are data-integrity warnings: the offending event is dropped and
/// the crawl continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    /// Event referenced a key that was never created
    #[error("no listing record for key {0}")]
    UnknownKey(ListingKey),

    /// Discovery tried to reuse a key
    #[error("listing key {0} already exists")]
    DuplicateKey(ListingKey),

    /// Write-once field was already set
    #[error("field {field} already set on listing {key}")]
    FieldAlreadySet { key: ListingKey, field: RecordField },

    /// Both prices present but the differential could not be computed
    #[error("cannot derive differential for listing {key}: {source}")]
    Pricing {
        key: ListingKey,
        #[source]
        source: PriceError,
    },
}

/// Errors writing the export table. These are fatal for a run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors loading configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} is not valid: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Result type alias for crawl operations.
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

/// Result type alias for valuation lookups.
pub type ValuationResult<T> = std::result::Result<T, ValuationError>;

/// Result type alias for store operations.
pub type CorrelationResult<T> = std::result::Result<T, CorrelationError>;

/// Result type alias for export operations.
pub type ExportResult<T> = std::result::Result<T, ExportError>;
