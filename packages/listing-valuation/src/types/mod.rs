//! Data types for the listing valuation pipeline.

pub mod config;
pub mod page;
pub mod record;

pub use page::Page;
pub use record::{KeySequence, ListingKey, ListingRecord, RecordField, RecordUpdate, VehicleInfo};
