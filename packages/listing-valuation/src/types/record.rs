//! Listing records and the typed updates that fill them in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Correlation key binding every event that belongs to one listing.
///
/// Assigned at discovery time, in discovery order, and never reused within
/// a run. Ordering by key reproduces discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListingKey(pub u64);

impl fmt::Display for ListingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-run source of fresh listing keys.
#[derive(Debug, Default)]
pub struct KeySequence {
    next: AtomicU64,
}

impl KeySequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next unused key.
    pub fn next_key(&self) -> ListingKey {
        ListingKey(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Vehicle metadata returned by the registry lookup.
///
/// The four values always arrive together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub model_id: String,
    pub distance: String,
    pub model_year: String,
    pub registration_date: String,
}

/// One discovered listing and everything learned about it so far.
///
/// Every optional field is write-once; see [`crate::store::CorrelationStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub key: ListingKey,

    /// Absolute URL of the listing page
    pub link: String,

    /// Price shown on the listing page
    pub listed_price: Option<String>,

    /// Dealer price from the valuation service
    pub estimated_price: Option<String>,

    /// `estimated_price - listed_price`
    pub price_differential: Option<String>,

    pub plate: Option<String>,

    pub vehicle: Option<VehicleInfo>,
}

impl ListingRecord {
    pub fn new(key: ListingKey, link: impl Into<String>) -> Self {
        Self {
            key,
            link: link.into(),
            listed_price: None,
            estimated_price: None,
            price_differential: None,
            plate: None,
            vehicle: None,
        }
    }

    /// Whether the field targeted by `update` already holds a value.
    pub fn has(&self, field: RecordField) -> bool {
        match field {
            RecordField::ListedPrice => self.listed_price.is_some(),
            RecordField::EstimatedPrice => self.estimated_price.is_some(),
            RecordField::PriceDifferential => self.price_differential.is_some(),
            RecordField::Plate => self.plate.is_some(),
            RecordField::Vehicle => self.vehicle.is_some(),
        }
    }

    /// Store the update's value. Callers check [`ListingRecord::has`] first.
    pub(crate) fn set(&mut self, update: RecordUpdate) {
        match update {
            RecordUpdate::ListedPrice(v) => self.listed_price = Some(v),
            RecordUpdate::EstimatedPrice(v) => self.estimated_price = Some(v),
            RecordUpdate::PriceDifferential(v) => self.price_differential = Some(v),
            RecordUpdate::Plate(v) => self.plate = Some(v),
            RecordUpdate::Vehicle(v) => self.vehicle = Some(v),
        }
    }

    pub fn model_id(&self) -> &str {
        self.vehicle.as_ref().map_or("", |v| v.model_id.as_str())
    }

    pub fn distance(&self) -> &str {
        self.vehicle.as_ref().map_or("", |v| v.distance.as_str())
    }

    pub fn model_year(&self) -> &str {
        self.vehicle.as_ref().map_or("", |v| v.model_year.as_str())
    }

    pub fn registration_date(&self) -> &str {
        self.vehicle.as_ref().map_or("", |v| v.registration_date.as_str())
    }
}

/// Names of the write-once fields on a [`ListingRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    ListedPrice,
    EstimatedPrice,
    PriceDifferential,
    Plate,
    Vehicle,
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordField::ListedPrice => "listed_price",
            RecordField::EstimatedPrice => "estimated_price",
            RecordField::PriceDifferential => "price_differential",
            RecordField::Plate => "plate",
            RecordField::Vehicle => "vehicle",
        };
        f.write_str(name)
    }
}

/// A single write-once assignment to a record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum RecordUpdate {
    ListedPrice(String),
    EstimatedPrice(String),
    PriceDifferential(String),
    Plate(String),
    Vehicle(VehicleInfo),
}

impl RecordUpdate {
    pub fn field(&self) -> RecordField {
        match self {
            RecordUpdate::ListedPrice(_) => RecordField::ListedPrice,
            RecordUpdate::EstimatedPrice(_) => RecordField::EstimatedPrice,
            RecordUpdate::PriceDifferential(_) => RecordField::PriceDifferential,
            RecordUpdate::Plate(_) => RecordField::Plate,
            RecordUpdate::Vehicle(_) => RecordField::Vehicle,
        }
    }
}
