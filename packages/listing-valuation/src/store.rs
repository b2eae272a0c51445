//! In-memory correlation store for listing records.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{CorrelationError, CorrelationResult};
use crate::events::CrawlEvent;
use crate::pricing;
use crate::types::{ListingKey, ListingRecord, RecordField, RecordUpdate};

/// Keyed accumulator of listing records for one crawl run.
///
/// Every mutation takes the single lock over the whole map, so the
/// write-once check and the write happen atomically. Nothing is awaited
/// while the lock is held.
#[derive(Debug, Default)]
pub struct CorrelationStore {
    records: Mutex<BTreeMap<ListingKey, ListingRecord>>,
}

impl CorrelationStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, BTreeMap<ListingKey, ListingRecord>> {
        // A panicking writer cannot leave a half-written record behind.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a record holding only its key and link.
    ///
    /// Discovery must hand out fresh keys; an existing key is rejected and
    /// the stored record is left as it was.
    pub fn create(&self, key: ListingKey, link: impl Into<String>) -> CorrelationResult<ListingRecord> {
        let mut records = self.records();
        if records.contains_key(&key) {
            return Err(CorrelationError::DuplicateKey(key));
        }

        let record = ListingRecord::new(key, link);
        records.insert(key, record.clone());
        Ok(record)
    }

    /// Apply a write-once update to one field of a record.
    pub fn update(&self, key: ListingKey, update: RecordUpdate) -> CorrelationResult<()> {
        let mut records = self.records();
        let record = records
            .get_mut(&key)
            .ok_or(CorrelationError::UnknownKey(key))?;

        let field = update.field();
        if record.has(field) {
            return Err(CorrelationError::FieldAlreadySet { key, field });
        }

        record.set(update);
        Ok(())
    }

    /// Fill in the price differential once both prices are known.
    ///
    /// Returns the value written, or `None` when a price is still missing or
    /// the differential was already set.
    pub fn fill_differential(&self, key: ListingKey) -> CorrelationResult<Option<String>> {
        let mut records = self.records();
        let record = records
            .get_mut(&key)
            .ok_or(CorrelationError::UnknownKey(key))?;

        if record.has(RecordField::PriceDifferential) {
            return Ok(None);
        }

        let (Some(listed), Some(estimated)) = (&record.listed_price, &record.estimated_price)
        else {
            return Ok(None);
        };

        let diff = pricing::differential(listed, estimated)
            .map_err(|source| CorrelationError::Pricing { key, source })?;

        record.set(RecordUpdate::PriceDifferential(diff.clone()));
        Ok(Some(diff))
    }

    /// Route a crawl event to `create` or `update`.
    pub fn apply(&self, event: &CrawlEvent) -> CorrelationResult<()> {
        match event {
            CrawlEvent::ListingDiscovered { key, link } => self.create(*key, link.clone()).map(|_| ()),
            other => match other.as_update() {
                Some(update) => self.update(other.key(), update),
                None => Ok(()),
            },
        }
    }

    /// Get a copy of one record.
    pub fn get(&self, key: ListingKey) -> Option<ListingRecord> {
        self.records().get(&key).cloned()
    }

    /// Copy of every record, ordered by key.
    ///
    /// Only meaningful once the crawl has finished; records still being
    /// enriched would otherwise show up half-filled.
    pub fn snapshot(&self) -> Vec<ListingRecord> {
        self.records().values().cloned().collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VehicleInfo;
    use std::collections::HashMap;
    use std::sync::{Arc, Barrier};

    fn store_with(key: u64) -> CorrelationStore {
        let store = CorrelationStore::new();
        store
            .create(ListingKey(key), format!("https://example.com/{key}"))
            .unwrap();
        store
    }

    #[test]
    fn test_create_sets_only_key_and_link() {
        let store = CorrelationStore::new();
        let record = store.create(ListingKey(1), "https://example.com/1").unwrap();

        assert_eq!(record.key, ListingKey(1));
        assert_eq!(record.link, "https://example.com/1");
        assert!(record.plate.is_none());
        assert!(record.listed_price.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_rejects_duplicate_key() {
        let store = store_with(1);
        let err = store.create(ListingKey(1), "https://example.com/other").unwrap_err();

        assert_eq!(err, CorrelationError::DuplicateKey(ListingKey(1)));
        assert_eq!(store.get(ListingKey(1)).unwrap().link, "https://example.com/1");
    }

    #[test]
    fn test_update_is_write_once() {
        let store = store_with(1);
        store
            .update(ListingKey(1), RecordUpdate::Plate("ABC123".into()))
            .unwrap();

        let err = store
            .update(ListingKey(1), RecordUpdate::Plate("XYZ999".into()))
            .unwrap_err();

        assert_eq!(
            err,
            CorrelationError::FieldAlreadySet {
                key: ListingKey(1),
                field: RecordField::Plate
            }
        );
        assert_eq!(store.get(ListingKey(1)).unwrap().plate.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_update_unknown_key_mutates_nothing() {
        let store = store_with(1);
        let before = store.snapshot();

        let err = store
            .update(ListingKey(42), RecordUpdate::ListedPrice("100".into()))
            .unwrap_err();

        assert_eq!(err, CorrelationError::UnknownKey(ListingKey(42)));
        assert_eq!(store.snapshot(), before);
        assert!(store.get(ListingKey(42)).is_none());
    }

    #[test]
    fn test_vehicle_fields_set_together_once() {
        let store = store_with(1);
        let first = VehicleInfo {
            model_id: "1".into(),
            distance: "100".into(),
            model_year: "2014".into(),
            registration_date: "2014-01-01".into(),
        };
        store
            .update(ListingKey(1), RecordUpdate::Vehicle(first.clone()))
            .unwrap();
        assert!(store
            .update(ListingKey(1), RecordUpdate::Vehicle(VehicleInfo::default()))
            .is_err());

        assert_eq!(store.get(ListingKey(1)).unwrap().vehicle, Some(first));
    }

    #[test]
    fn test_fill_differential_waits_for_both_prices() {
        let store = store_with(1);
        let key = ListingKey(1);

        store.update(key, RecordUpdate::ListedPrice("185000".into())).unwrap();
        assert_eq!(store.fill_differential(key).unwrap(), None);
        assert!(store.get(key).unwrap().price_differential.is_none());

        store
            .update(key, RecordUpdate::EstimatedPrice("201500".into()))
            .unwrap();
        assert_eq!(store.fill_differential(key).unwrap(), Some("16500".to_string()));

        // Second call is a no-op
        assert_eq!(store.fill_differential(key).unwrap(), None);
        assert_eq!(
            store.get(key).unwrap().price_differential.as_deref(),
            Some("16500")
        );
    }

    #[test]
    fn test_fill_differential_bad_price_leaves_field_absent() {
        let store = store_with(1);
        let key = ListingKey(1);
        store.update(key, RecordUpdate::ListedPrice("185000".into())).unwrap();
        store.update(key, RecordUpdate::EstimatedPrice("n/a".into())).unwrap();

        let err = store.fill_differential(key).unwrap_err();
        assert!(matches!(err, CorrelationError::Pricing { .. }));
        assert!(store.get(key).unwrap().price_differential.is_none());
    }

    #[test]
    fn test_apply_interleaved_events() {
        let store = CorrelationStore::new();
        let events = vec![
            CrawlEvent::ListingDiscovered { key: ListingKey(0), link: "a".into() },
            CrawlEvent::ListingDiscovered { key: ListingKey(1), link: "b".into() },
            CrawlEvent::PlateExtracted { key: ListingKey(1), plate: "BBB222".into() },
            CrawlEvent::PriceExtracted { key: ListingKey(0), price: "100".into() },
            CrawlEvent::PlateExtracted { key: ListingKey(0), plate: "AAA111".into() },
            CrawlEvent::PriceExtracted { key: ListingKey(1), price: "200".into() },
            // Replayed event with a different value
            CrawlEvent::PlateExtracted { key: ListingKey(0), plate: "ZZZ999".into() },
        ];

        let results: Vec<_> = events.iter().map(|e| store.apply(e)).collect();
        assert!(results[..6].iter().all(|r| r.is_ok()));
        assert!(results[6].is_err());

        let snapshot = store.snapshot();
        assert_eq!(snapshot[0].plate.as_deref(), Some("AAA111"));
        assert_eq!(snapshot[0].listed_price.as_deref(), Some("100"));
        assert_eq!(snapshot[1].plate.as_deref(), Some("BBB222"));
        assert_eq!(snapshot[1].listed_price.as_deref(), Some("200"));
    }

    fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let first = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, first.clone());
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_write_once_holds_in_every_order() {
        let key = ListingKey(0);
        let events = [
            CrawlEvent::PriceExtracted { key, price: "185000".into() },
            CrawlEvent::PlateExtracted { key, plate: "ABC123".into() },
            // Conflicting replay of the plate
            CrawlEvent::PlateExtracted { key, plate: "XYZ999".into() },
            CrawlEvent::EstimateResolved { key, price: "201500".into() },
        ];

        let orders = permutations(&events);
        assert_eq!(orders.len(), 24);

        let mut by_first_plate: HashMap<String, Vec<ListingRecord>> = HashMap::new();
        for order in orders {
            let store = store_with(0);
            let rejected = order.iter().filter(|e| store.apply(e).is_err()).count();
            store.fill_differential(key).unwrap();

            let first_plate = order
                .iter()
                .find_map(|e| match e {
                    CrawlEvent::PlateExtracted { plate, .. } => Some(plate.clone()),
                    _ => None,
                })
                .unwrap();

            let snapshot = store.snapshot();
            assert_eq!(rejected, 1);
            assert_eq!(snapshot.len(), 1);
            assert_eq!(snapshot[0].plate.as_deref(), Some(first_plate.as_str()));
            assert_eq!(snapshot[0].listed_price.as_deref(), Some("185000"));
            assert_eq!(snapshot[0].estimated_price.as_deref(), Some("201500"));
            assert_eq!(snapshot[0].price_differential.as_deref(), Some("16500"));

            by_first_plate
                .entry(first_plate)
                .or_default()
                .push(snapshot[0].clone());
        }

        assert_eq!(by_first_plate.len(), 2);
        for records in by_first_plate.values() {
            assert_eq!(records.len(), 12);
            assert!(records.iter().all(|r| r == &records[0]));
        }
    }

    #[test]
    fn test_snapshot_ordered_by_key() {
        let store = CorrelationStore::new();
        for key in [5, 1, 3] {
            store.create(ListingKey(key), key.to_string()).unwrap();
        }

        let keys: Vec<_> = store.snapshot().into_iter().map(|r| r.key.0).collect();
        assert_eq!(keys, vec![1, 3, 5]);
    }

    #[test]
    fn test_concurrent_updates_keep_exactly_one_value() {
        let store = Arc::new(store_with(7));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    store
                        .update(ListingKey(7), RecordUpdate::Plate(format!("ABC{:03}", i)))
                        .is_ok()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1);
        let plate = store.get(ListingKey(7)).unwrap().plate.unwrap();
        assert!((0..8).any(|i| plate == format!("ABC{:03}", i)));
    }
}
