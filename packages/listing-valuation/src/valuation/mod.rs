//! Registry and valuation lookups.
//!
//! A plate is first resolved to vehicle metadata through the registry; the
//! metadata then feeds the valuation lookup. The second call depends on the
//! first, so the two always run in sequence for one listing. Lookups for
//! different listings share no state and may run concurrently.

pub mod bilpriser;

use async_trait::async_trait;

use crate::error::{ValuationError, ValuationResult};
use crate::types::VehicleInfo;

pub use bilpriser::BilprisClient;

/// External services that identify a vehicle and estimate its price.
#[async_trait]
pub trait ValuationApi: Send + Sync {
    /// Resolve a registration plate to vehicle metadata.
    async fn lookup_vehicle(&self, plate: &str) -> ValuationResult<VehicleInfo>;

    /// Estimated dealer price for a resolved vehicle.
    async fn lookup_price(&self, plate: &str, vehicle: &VehicleInfo) -> ValuationResult<String>;
}

/// Outcome of running both lookups for one plate.
#[derive(Debug)]
pub struct Enrichment {
    pub vehicle: ValuationResult<VehicleInfo>,

    /// `None` when the registry lookup failed and valuation was skipped
    pub estimated_price: Option<ValuationResult<String>>,
}

/// Run the registry lookup and, if it succeeds, the valuation lookup.
pub async fn enrich<V: ValuationApi + ?Sized>(api: &V, plate: &str) -> Enrichment {
    let vehicle = api.lookup_vehicle(plate).await;

    let estimated_price = match &vehicle {
        Ok(info) => Some(api.lookup_price(plate, info).await),
        Err(_) => None,
    };

    Enrichment {
        vehicle,
        estimated_price,
    }
}

/// Map a reqwest failure onto the valuation taxonomy.
pub(crate) fn from_reqwest(url: &str, e: reqwest::Error) -> ValuationError {
    if e.is_timeout() {
        ValuationError::Timeout {
            url: url.to_string(),
        }
    } else {
        ValuationError::Http(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockValuation;

    fn vehicle() -> VehicleInfo {
        VehicleInfo {
            model_id: "4521".into(),
            distance: "12000".into(),
            model_year: "2015".into(),
            registration_date: "2015-04-01".into(),
        }
    }

    #[tokio::test]
    async fn test_enrich_runs_both_lookups() {
        let api = MockValuation::new().with_vehicle("ABC123", vehicle(), "201500");

        let enrichment = enrich(&api, "ABC123").await;

        assert_eq!(enrichment.vehicle.unwrap(), vehicle());
        assert_eq!(enrichment.estimated_price.unwrap().unwrap(), "201500");
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_registry_timeout_skips_valuation() {
        let api = MockValuation::new().with_registry_timeout("ABC123");

        let enrichment = enrich(&api, "ABC123").await;

        assert!(enrichment.vehicle.as_ref().unwrap_err().is_timeout());
        assert!(enrichment.estimated_price.is_none());
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_valuation_failure_keeps_vehicle() {
        let api = MockValuation::new()
            .with_vehicle("ABC123", vehicle(), "201500")
            .with_price_failure("ABC123");

        let enrichment = enrich(&api, "ABC123").await;

        assert!(enrichment.vehicle.is_ok());
        assert!(matches!(enrichment.estimated_price, Some(Err(_))));
    }
}
