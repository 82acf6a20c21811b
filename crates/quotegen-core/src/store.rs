//! Quote store
//!
//! The `Store` holds the authoritative in-memory collection and is the only
//! path that writes it to the durable slot. Every mutation recomputes the
//! category index and flushes.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = QuoteStore::open(QuotePersistence::from_config(&config));
//!
//! store.add("Stay hungry.", "Life")?;
//! let life = store.list(&CategoryFilter::from_value("Life"));
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::categories::CategoryIndex;
use crate::error::{QuoteError, QuoteResult};
use crate::models::{seed_quotes, CategoryFilter, Quote};
use crate::storage::{QuotePersistence, StorageError, StorageResult};

/// Store shared between the command layer and the sync engine
pub type SharedStore = Arc<Mutex<QuoteStore>>;

/// Uniform source of values in `[0, 1)`
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// Random source drawing from v4 UUIDs
///
/// Uses the 48 leading bits, which are all random in a v4 UUID.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidRandom;

impl RandomSource for UuidRandom {
    fn next_unit(&mut self) -> f64 {
        let bits = (Uuid::new_v4().as_u128() >> 80) as u64;
        bits as f64 / (1u64 << 48) as f64
    }
}

/// Where the collection came from when the store was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrigin {
    /// Loaded from the durable slot
    Restored,
    /// Durable slot absent or invalid; seed collection used
    Seeded,
}

/// Result of a mutation plus the outcome of the durable flush that followed
///
/// The in-memory change stands even when the flush failed.
#[derive(Debug)]
pub struct Persisted<T> {
    pub value: T,
    pub flush: StorageResult<()>,
}

impl<T> Persisted<T> {
    /// The flush error, if the write failed
    pub fn storage_error(&self) -> Option<&StorageError> {
        self.flush.as_ref().err()
    }
}

/// Authoritative quote collection
pub struct QuoteStore {
    quotes: Vec<Quote>,
    index: CategoryIndex,
    persistence: QuotePersistence,
    rng: Box<dyn RandomSource>,
    origin: StoreOrigin,
}

impl QuoteStore {
    /// Open the store from durable storage
    ///
    /// Falls back to the seed collection (and persists it) when nothing valid
    /// is stored.
    pub fn open(persistence: QuotePersistence) -> Self {
        let (quotes, origin) = match persistence.load_durable() {
            Some(quotes) => {
                debug!("Restored {} quotes", quotes.len());
                (quotes, StoreOrigin::Restored)
            }
            None => {
                info!("No stored quotes, seeding defaults");
                (seed_quotes(), StoreOrigin::Seeded)
            }
        };

        let mut store = Self {
            index: CategoryIndex::build(&quotes),
            quotes,
            persistence,
            rng: Box::new(UuidRandom),
            origin,
        };

        if origin == StoreOrigin::Seeded {
            let flush = store.flush();
            store.log_flush(flush.as_ref());
        }

        store
    }

    /// Replace the random source
    pub fn with_random(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Wrap the store for sharing with the sync engine
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn origin(&self) -> StoreOrigin {
        self.origin
    }

    // ==================== Queries ====================

    /// The full collection in insertion order
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Category index for the current collection
    pub fn categories(&self) -> &CategoryIndex {
        &self.index
    }

    /// Quotes passing `filter`, in collection order; empty when none match
    pub fn list(&self, filter: &CategoryFilter) -> Vec<Quote> {
        self.quotes
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect()
    }

    /// Pick one quote uniformly from the pool selected by `filter`
    pub fn pick_random(&mut self, filter: &CategoryFilter) -> QuoteResult<Quote> {
        let pool: Vec<&Quote> = self.quotes.iter().filter(|q| filter.matches(q)).collect();
        if pool.is_empty() {
            return Err(QuoteError::EmptyPool {
                filter: filter.to_string(),
            });
        }

        let scaled = (self.rng.next_unit() * pool.len() as f64).floor() as usize;
        let idx = scaled.min(pool.len() - 1);
        Ok(pool[idx].clone())
    }

    // ==================== Mutations ====================

    /// Append a quote from user input
    ///
    /// Fails with `QuoteError::Validation` (and leaves the collection
    /// untouched) if either field is empty after trimming.
    pub fn add(&mut self, text: &str, category: &str) -> QuoteResult<Persisted<Quote>> {
        let quote = Quote::parse(text, category)?;
        self.quotes.push(quote.clone());
        self.index = CategoryIndex::build(&self.quotes);

        let flush = self.flush();
        self.log_flush(flush.as_ref());
        Ok(Persisted { value: quote, flush })
    }

    /// Swap the entire collection in one step
    pub fn replace_all(&mut self, quotes: Vec<Quote>) -> Persisted<()> {
        self.index = CategoryIndex::build(&quotes);
        self.quotes = quotes;

        let flush = self.flush();
        self.log_flush(flush.as_ref());
        Persisted { value: (), flush }
    }

    /// Clear the durable slot and restore the seed collection
    pub fn reset(&mut self) -> Persisted<()> {
        if let Err(e) = self.persistence.clear_durable() {
            warn!("Failed to clear stored quotes: {}", e);
        }
        self.origin = StoreOrigin::Seeded;
        self.replace_all(seed_quotes())
    }

    /// Write the collection to the durable slot
    pub fn flush(&mut self) -> StorageResult<()> {
        self.persistence.save_durable(&self.quotes)
    }

    fn log_flush(&self, flush: Result<&(), &StorageError>) {
        if let Err(e) = flush {
            warn!(
                "Failed to save {} quotes, keeping them in memory: {}",
                self.quotes.len(),
                e
            );
        }
    }

    // ==================== Session ====================

    /// Record `quote` as the last one shown
    pub fn record_viewed(&mut self, quote: &Quote) -> StorageResult<()> {
        self.persistence.save_last_quote(quote)
    }

    /// Last quote shown in this session
    pub fn last_viewed(&self) -> Option<Quote> {
        self.persistence.load_last_quote()
    }

    /// Remember the selected filter for this session
    pub fn select_filter(&mut self, filter: &CategoryFilter) -> StorageResult<()> {
        self.persistence.save_last_category(filter.as_value())
    }

    /// Raw filter value saved for this session
    pub fn saved_filter(&self) -> Option<String> {
        self.persistence.load_last_category()
    }

    /// Effective filter: the saved value if it still names a category,
    /// otherwise `All`
    pub fn restore_filter(&self) -> CategoryFilter {
        self.index.restore(self.saved_filter().as_deref())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::{MemorySlots, SlotStore};

    /// Random source replaying fixed values
    pub(crate) struct FixedRandom(pub Vec<f64>);

    impl RandomSource for FixedRandom {
        fn next_unit(&mut self) -> f64 {
            if self.0.len() > 1 {
                self.0.remove(0)
            } else {
                self.0.first().copied().unwrap_or(0.0)
            }
        }
    }

    pub(crate) fn memory_store() -> QuoteStore {
        QuoteStore::open(QuotePersistence::new(
            "test",
            MemorySlots::new(),
            MemorySlots::new(),
        ))
    }

    #[test]
    fn test_open_seeds_when_empty() {
        let store = memory_store();
        assert_eq!(store.origin(), StoreOrigin::Seeded);
        assert_eq!(store.len(), 4);
        assert_eq!(store.categories().len(), 4);
    }

    #[test]
    fn test_open_seeds_on_corrupt_slot() {
        let mut durable = MemorySlots::new();
        durable.write("test_quotes", "{broken").unwrap();
        let store = QuoteStore::open(QuotePersistence::new("test", durable, MemorySlots::new()));
        assert_eq!(store.origin(), StoreOrigin::Seeded);
        assert_eq!(store.quotes(), seed_quotes().as_slice());
    }

    #[test]
    fn test_open_restores_stored_collection() {
        let mut durable = MemorySlots::new();
        durable
            .write("test_quotes", r#"[{"text": "Kept", "category": "Stored"}]"#)
            .unwrap();
        let store = QuoteStore::open(QuotePersistence::new("test", durable, MemorySlots::new()));
        assert_eq!(store.origin(), StoreOrigin::Restored);
        assert_eq!(store.quotes(), &[Quote::new("Kept", "Stored")]);
    }

    #[test]
    fn test_add_appends_and_updates_index() {
        let mut store = memory_store();
        let added = store.add("  Test quote ", "TestCat").unwrap();
        assert!(added.flush.is_ok());
        assert_eq!(added.value, Quote::new("Test quote", "TestCat"));

        assert_eq!(store.len(), 5);
        assert!(store.categories().contains("TestCat"));
        assert_eq!(store.list(&CategoryFilter::All).last(), Some(&added.value));
    }

    #[test]
    fn test_add_rejects_empty_fields_without_mutation() {
        let mut store = memory_store();
        assert!(matches!(store.add("", "x"), Err(QuoteError::Validation(_))));
        assert!(matches!(store.add("x", ""), Err(QuoteError::Validation(_))));
        assert!(matches!(store.add("   ", "x"), Err(QuoteError::Validation(_))));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_add_survives_flush_failure() {
        let mut store = QuoteStore::open(QuotePersistence::new(
            "test",
            MemorySlots::with_quota(4),
            MemorySlots::new(),
        ));
        let added = store.add("Still here", "Memory").unwrap();
        assert!(added.storage_error().is_some());
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_list_filters_and_is_repeatable() {
        let mut store = memory_store();
        store.add("Another life", "Life").unwrap();

        let filter = CategoryFilter::from_value("Life");
        let first = store.list(&filter);
        let second = store.list(&filter);
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert!(first.iter().all(|q| q.category == "Life"));

        assert!(store.list(&CategoryFilter::from_value("Nope")).is_empty());
    }

    #[test]
    fn test_pick_random_uses_scaled_floor() {
        let mut store = memory_store().with_random(FixedRandom(vec![0.0, 0.99, 0.5]));
        let seed = seed_quotes();

        assert_eq!(store.pick_random(&CategoryFilter::All).unwrap(), seed[0]);
        assert_eq!(store.pick_random(&CategoryFilter::All).unwrap(), seed[3]);
        assert_eq!(store.pick_random(&CategoryFilter::All).unwrap(), seed[2]);
    }

    #[test]
    fn test_pick_random_clamps_out_of_range_source() {
        let mut store = memory_store().with_random(FixedRandom(vec![1.0]));
        assert_eq!(
            store.pick_random(&CategoryFilter::All).unwrap(),
            seed_quotes()[3]
        );
    }

    #[test]
    fn test_pick_random_respects_filter() {
        let mut store = memory_store();
        for _ in 0..20 {
            let quote = store
                .pick_random(&CategoryFilter::from_value("Success"))
                .unwrap();
            assert_eq!(quote.category, "Success");
        }
    }

    #[test]
    fn test_pick_random_empty_pool() {
        let mut store = memory_store();
        let err = store
            .pick_random(&CategoryFilter::from_value("Obscure"))
            .unwrap_err();
        assert!(matches!(err, QuoteError::EmptyPool { ref filter } if filter == "Obscure"));
    }

    #[test]
    fn test_uuid_random_in_unit_range() {
        let mut rng = UuidRandom;
        for _ in 0..100 {
            let value = rng.next_unit();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_replace_all_recomputes_index() {
        let mut store = memory_store();
        store
            .replace_all(vec![Quote::new("Only", "Single")])
            .flush
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.categories().categories(), &["Single".to_string()]);
    }

    #[test]
    fn test_reset_restores_seed() {
        let mut store = memory_store();
        store.add("Temporary", "Gone").unwrap();
        store.reset().flush.unwrap();
        assert_eq!(store.quotes(), seed_quotes().as_slice());
        assert!(!store.categories().contains("Gone"));
    }

    #[test]
    fn test_restore_filter_falls_back_to_all() {
        let mut store = memory_store();
        store.add("Rare", "Obscure").unwrap();
        store
            .select_filter(&CategoryFilter::from_value("Obscure"))
            .unwrap();
        assert_eq!(
            store.restore_filter(),
            CategoryFilter::Category("Obscure".to_string())
        );

        store.reset().flush.unwrap();
        assert_eq!(store.saved_filter().as_deref(), Some("Obscure"));
        assert_eq!(store.restore_filter(), CategoryFilter::All);
    }

    #[test]
    fn test_record_viewed() {
        let mut store = memory_store();
        assert!(store.last_viewed().is_none());

        let quote = store.quotes()[1].clone();
        store.record_viewed(&quote).unwrap();
        assert_eq!(store.last_viewed(), Some(quote));
    }
}
