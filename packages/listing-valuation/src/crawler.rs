//! Crawl orchestration: index page → listing pages → valuation lookups.
//!
//! Every listing gets its key the moment its link is found on the index
//! page. The key travels with the [`ListingVisit`] into the visit's future,
//! so events from concurrent visits always land on their own record.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::CrawlResult;
use crate::events::CrawlEvent;
use crate::extract::{plate_from_text, price_from_text};
use crate::fetch::{parse_url, PageFetcher};
use crate::parse::PageParser;
use crate::store::CorrelationStore;
use crate::types::{config::CrawlConfig, KeySequence, ListingKey};
use crate::valuation::{self, ValuationApi};

/// One listing page to visit, carrying the key of its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingVisit {
    pub key: ListingKey,
    pub url: Url,
}

/// Counts for one finished crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub discovered: usize,
    pub visited: usize,
    pub failed_visits: usize,
    pub plates_found: usize,
    pub enriched: usize,
    pub correlation_warnings: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct VisitOutcome {
    visited: bool,
    plate_found: bool,
    enriched: bool,
    warnings: usize,
}

/// Drives one crawl run and fills the correlation store.
pub struct Crawler<F, V> {
    config: CrawlConfig,
    fetcher: F,
    valuation: V,
    parser: PageParser,
    store: Arc<CorrelationStore>,
    keys: KeySequence,
}

impl<F: PageFetcher, V: ValuationApi> Crawler<F, V> {
    pub fn new(config: CrawlConfig, fetcher: F, valuation: V) -> CrawlResult<Self> {
        let parser = PageParser::new(&config)?;
        Ok(Self {
            config,
            fetcher,
            valuation,
            parser,
            store: Arc::new(CorrelationStore::new()),
            keys: KeySequence::new(),
        })
    }

    /// Records accumulated so far. Take a snapshot only after [`Crawler::run`].
    pub fn store(&self) -> &Arc<CorrelationStore> {
        &self.store
    }

    /// Crawl the index page and every listing on it.
    ///
    /// Returns once every listing visit has finished. Only a failure to
    /// fetch the index page itself is an error; per-listing failures are
    /// logged and leave the affected fields absent.
    pub async fn run(&self) -> CrawlResult<CrawlSummary> {
        let started_at = Utc::now();
        let index_url = parse_url(&self.config.index_url)?;

        info!(url = %index_url, concurrency = self.config.concurrency, "Starting crawl");

        let index = self.fetcher.fetch(&index_url).await?;
        let mut links = self.parser.listing_links(&index);
        if let Some(max) = self.config.max_listings {
            links.truncate(max);
        }

        let mut warnings = 0;
        let mut visits = Vec::with_capacity(links.len());
        for url in links {
            match self.discover(url) {
                Some(visit) => visits.push(visit),
                None => warnings += 1,
            }
        }

        info!(url = %index_url, listings = visits.len(), "Index page parsed");

        let discovered = visits.len();
        let outcomes: Vec<VisitOutcome> = stream::iter(visits)
            .map(|visit| self.visit_listing(visit))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let summary = CrawlSummary {
            discovered,
            visited: outcomes.iter().filter(|o| o.visited).count(),
            failed_visits: outcomes.iter().filter(|o| !o.visited).count(),
            plates_found: outcomes.iter().filter(|o| o.plate_found).count(),
            enriched: outcomes.iter().filter(|o| o.enriched).count(),
            correlation_warnings: warnings + outcomes.iter().map(|o| o.warnings).sum::<usize>(),
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            url = %index_url,
            discovered = summary.discovered,
            visited = summary.visited,
            failed_visits = summary.failed_visits,
            plates_found = summary.plates_found,
            enriched = summary.enriched,
            correlation_warnings = summary.correlation_warnings,
            "Crawl completed"
        );

        Ok(summary)
    }

    /// Assign a fresh key to a listing link and create its record.
    fn discover(&self, url: Url) -> Option<ListingVisit> {
        let key = self.keys.next_key();
        info!(key = %key, url = %url, "Link found");

        let event = CrawlEvent::ListingDiscovered {
            key,
            link: url.to_string(),
        };
        self.record(&event, &url).then_some(ListingVisit { key, url })
    }

    /// Visit one listing page and enrich its record.
    async fn visit_listing(&self, visit: ListingVisit) -> VisitOutcome {
        let ListingVisit { key, url } = visit;
        let mut outcome = VisitOutcome::default();

        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(key = %key, stage = "listing", url = %url, error = %e, "Listing visit failed");
                return outcome;
            }
        };
        outcome.visited = true;

        let fragments = self.parser.listing_fragments(&page.html);

        match fragments.price_text.as_deref().and_then(price_from_text) {
            Some(price) => {
                info!(key = %key, url = %url, price = %price, "Listed price found");
                if self.record(&CrawlEvent::PriceExtracted { key, price }, &url) {
                    self.derive_differential(key, &url, &mut outcome);
                } else {
                    outcome.warnings += 1;
                }
            }
            None => debug!(key = %key, url = %url, "No listed price on page"),
        }

        let Some(plate) = fragments.plate_text.as_deref().and_then(plate_from_text) else {
            debug!(key = %key, url = %url, "No plate on page");
            return outcome;
        };

        info!(key = %key, url = %url, plate = %plate, "Plate found");
        outcome.plate_found = true;

        let plate_event = CrawlEvent::PlateExtracted {
            key,
            plate: plate.clone(),
        };
        if !self.record(&plate_event, &url) {
            // The record keeps an earlier plate; do not enrich with this one.
            outcome.warnings += 1;
            return outcome;
        }

        self.enrich(key, &url, &plate, &mut outcome).await;
        outcome
    }

    /// Registry lookup, then valuation lookup, then the differential.
    async fn enrich(&self, key: ListingKey, url: &Url, plate: &str, outcome: &mut VisitOutcome) {
        let enrichment = valuation::enrich(&self.valuation, plate).await;

        let vehicle = match enrichment.vehicle {
            Ok(vehicle) => vehicle,
            Err(e) => {
                warn!(key = %key, stage = "registry", url = %url, plate = %plate, error = %e, "Registry lookup failed");
                return;
            }
        };
        debug!(key = %key, model_id = %vehicle.model_id, "Vehicle resolved");
        if !self.record(&CrawlEvent::VehicleResolved { key, vehicle }, url) {
            outcome.warnings += 1;
        }

        match enrichment.estimated_price {
            Some(Ok(price)) => {
                info!(key = %key, url = %url, estimated = %price, "Estimated price found");
                if self.record(&CrawlEvent::EstimateResolved { key, price }, url) {
                    outcome.enriched = true;
                    self.derive_differential(key, url, outcome);
                } else {
                    outcome.warnings += 1;
                }
            }
            Some(Err(e)) => {
                warn!(key = %key, stage = "valuation", url = %url, plate = %plate, error = %e, "Valuation lookup failed");
            }
            None => {}
        }
    }

    fn derive_differential(&self, key: ListingKey, url: &Url, outcome: &mut VisitOutcome) {
        match self.store.fill_differential(key) {
            Ok(Some(diff)) => debug!(key = %key, diff = %diff, "Price differential computed"),
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, stage = "differential", url = %url, error = %e, "Differential not computed");
                outcome.warnings += 1;
            }
        }
    }

    /// Apply an event to the store; protocol violations are logged and dropped.
    fn record(&self, event: &CrawlEvent, url: &Url) -> bool {
        match self.store.apply(event) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    key = %event.key(),
                    stage = event.stage(),
                    url = %url,
                    error = %e,
                    "Correlation event dropped"
                );
                false
            }
        }
    }
}
