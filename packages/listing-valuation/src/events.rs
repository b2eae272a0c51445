use serde::{Deserialize, Serialize};

use crate::types::{ListingKey, RecordUpdate, VehicleInfo};

/// Facts produced while crawling, each tagged with the listing it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    /// A listing link was found on the index page
    ListingDiscovered { key: ListingKey, link: String },

    /// The listing page showed a price
    PriceExtracted { key: ListingKey, price: String },

    /// The listing page showed a registration plate
    PlateExtracted { key: ListingKey, plate: String },

    /// Registry lookup succeeded
    VehicleResolved { key: ListingKey, vehicle: VehicleInfo },

    /// Valuation lookup succeeded
    EstimateResolved { key: ListingKey, price: String },
}

impl CrawlEvent {
    pub fn key(&self) -> ListingKey {
        match self {
            CrawlEvent::ListingDiscovered { key, .. }
            | CrawlEvent::PriceExtracted { key, .. }
            | CrawlEvent::PlateExtracted { key, .. }
            | CrawlEvent::VehicleResolved { key, .. }
            | CrawlEvent::EstimateResolved { key, .. } => *key,
        }
    }

    /// Short stage name used in log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            CrawlEvent::ListingDiscovered { .. } => "discovery",
            CrawlEvent::PriceExtracted { .. } => "price",
            CrawlEvent::PlateExtracted { .. } => "plate",
            CrawlEvent::VehicleResolved { .. } => "registry",
            CrawlEvent::EstimateResolved { .. } => "valuation",
        }
    }

    /// The record update this event carries, if it is not a discovery.
    pub fn as_update(&self) -> Option<RecordUpdate> {
        match self {
            CrawlEvent::ListingDiscovered { .. } => None,
            CrawlEvent::PriceExtracted { price, .. } => Some(RecordUpdate::ListedPrice(price.clone())),
            CrawlEvent::PlateExtracted { plate, .. } => Some(RecordUpdate::Plate(plate.clone())),
            CrawlEvent::VehicleResolved { vehicle, .. } => Some(RecordUpdate::Vehicle(vehicle.clone())),
            CrawlEvent::EstimateResolved { price, .. } => {
                Some(RecordUpdate::EstimatedPrice(price.clone()))
            }
        }
    }
}
