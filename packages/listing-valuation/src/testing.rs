//! Testing utilities including mock implementations.
//!
//! These let the crawl pipeline run end to end without network access.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use crate::error::{CrawlError, CrawlResult, ValuationError, ValuationResult};
use crate::fetch::PageFetcher;
use crate::types::{Page, VehicleInfo};
use crate::valuation::ValuationApi;

/// A mock fetcher serving canned HTML by URL.
///
/// Unknown URLs answer with HTTP 404.
#[derive(Default, Clone)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, String>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), html.into());
        self
    }

    /// Delay the response for `url`, to force visits to finish out of order.
    pub fn with_delay(self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(url.into(), delay);
        self
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> CrawlResult<Page> {
        self.calls.write().unwrap().push(url.to_string());

        let delay = self.delays.read().unwrap().get(url.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let html = self.pages.read().unwrap().get(url.as_str()).cloned();
        match html {
            Some(html) => Ok(Page::new(url.clone(), html)),
            None => Err(CrawlError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Record of a call made to the mock valuation API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockValuationCall {
    Vehicle { plate: String },
    Price { plate: String, model_id: String },
}

/// A mock valuation API with per-plate answers.
///
/// Plates without a configured vehicle fail the registry lookup with HTTP 404.
#[derive(Default, Clone)]
pub struct MockValuation {
    vehicles: Arc<RwLock<HashMap<String, VehicleInfo>>>,
    prices: Arc<RwLock<HashMap<String, String>>>,
    registry_timeouts: Arc<RwLock<HashSet<String>>>,
    price_failures: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<MockValuationCall>>>,
}

impl MockValuation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer both lookups for `plate`.
    pub fn with_vehicle(
        self,
        plate: impl Into<String>,
        vehicle: VehicleInfo,
        price: impl Into<String>,
    ) -> Self {
        let plate = plate.into();
        self.vehicles.write().unwrap().insert(plate.clone(), vehicle);
        self.prices.write().unwrap().insert(plate, price.into());
        self
    }

    /// Make the registry lookup for `plate` time out.
    pub fn with_registry_timeout(self, plate: impl Into<String>) -> Self {
        self.registry_timeouts.write().unwrap().insert(plate.into());
        self
    }

    /// Make the valuation lookup for `plate` return a malformed payload.
    pub fn with_price_failure(self, plate: impl Into<String>) -> Self {
        self.price_failures.write().unwrap().insert(plate.into());
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockValuationCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ValuationApi for MockValuation {
    async fn lookup_vehicle(&self, plate: &str) -> ValuationResult<VehicleInfo> {
        self.calls.write().unwrap().push(MockValuationCall::Vehicle {
            plate: plate.to_string(),
        });

        if self.registry_timeouts.read().unwrap().contains(plate) {
            return Err(ValuationError::Timeout {
                url: format!("mock://registry/{plate}"),
            });
        }

        self.vehicles
            .read()
            .unwrap()
            .get(plate)
            .cloned()
            .ok_or_else(|| ValuationError::Status {
                url: format!("mock://registry/{plate}"),
                status: 404,
            })
    }

    async fn lookup_price(&self, plate: &str, vehicle: &VehicleInfo) -> ValuationResult<String> {
        self.calls.write().unwrap().push(MockValuationCall::Price {
            plate: plate.to_string(),
            model_id: vehicle.model_id.clone(),
        });

        if self.price_failures.read().unwrap().contains(plate) {
            let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
            return Err(ValuationError::MalformedPayload(err));
        }

        self.prices
            .read()
            .unwrap()
            .get(plate)
            .cloned()
            .ok_or(ValuationError::MissingField("valued_dealer_price"))
    }
}

/// Index page HTML linking to each of `hrefs` with the default selector.
pub fn index_html(hrefs: &[&str]) -> String {
    let links: String = hrefs
        .iter()
        .map(|href| format!(r#"<a class="item-link" href="{href}">listing</a>"#))
        .collect();
    format!(r#"<html><body><div id="item_list">{links}</div></body></html>"#)
}

/// Listing page HTML with optional price and aside text.
pub fn listing_html(price: Option<&str>, aside: Option<&str>) -> String {
    let price = price
        .map(|p| format!(r#"<p class="list_price">{p}</p>"#))
        .unwrap_or_default();
    let aside = aside
        .map(|a| format!(r#"<aside class="body_aside">{a}</aside>"#))
        .unwrap_or_default();
    format!("<html><body>{price}{aside}</body></html>")
}
