//! Quote persistence
//!
//! Serializes the quote collection into the durable slot and keeps the
//! session-scoped values (last viewed quote, last selected category) in
//! a separate slot store.
//!
//! Keys, namespaced by the app name:
//! - `<app>_quotes` (durable) - JSON array of `{text, category}`
//! - `<app>_last_quote` (session) - JSON object
//! - `<app>_last_category` (session) - plain string

use serde::Deserialize;
use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};
use super::slots::{FileSlots, MemorySlots, SlotStore};
use crate::config::Config;
use crate::models::Quote;

/// Persistence layer for the quote collection and session values
pub struct QuotePersistence {
    durable: Box<dyn SlotStore>,
    session: Box<dyn SlotStore>,
    keys: SlotKeys,
}

/// Slot keys for one app namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotKeys {
    pub quotes: String,
    pub last_quote: String,
    pub last_category: String,
}

impl SlotKeys {
    /// Build the keys for an app name
    pub fn for_app(app: &str) -> Self {
        Self {
            quotes: format!("{}_quotes", app),
            last_quote: format!("{}_last_quote", app),
            last_category: format!("{}_last_category", app),
        }
    }
}

/// Shape check for stored elements: both fields must be strings
#[derive(Deserialize)]
struct StoredQuote {
    text: String,
    category: String,
}

impl QuotePersistence {
    /// Create a persistence handler over explicit slot stores
    pub fn new(
        app: &str,
        durable: impl SlotStore + 'static,
        session: impl SlotStore + 'static,
    ) -> Self {
        Self {
            durable: Box::new(durable),
            session: Box::new(session),
            keys: SlotKeys::for_app(app),
        }
    }

    /// File-backed durable and session slots at the configured locations
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.app_name,
            FileSlots::new(config.durable_slot_dir()),
            FileSlots::new(config.session_slot_dir()),
        )
    }

    /// File-backed durable slots with an in-memory session
    ///
    /// Used by long-lived processes where the session is the process itself.
    pub fn with_memory_session(config: &Config) -> Self {
        Self::new(
            &config.app_name,
            FileSlots::new(config.durable_slot_dir()),
            MemorySlots::new(),
        )
    }

    // ==================== Durable slot ====================

    /// Load the stored collection
    ///
    /// Returns `None` if the slot is absent, unreadable, not valid JSON, or
    /// any element is not a `{text: string, category: string}` object. The
    /// caller falls back to the seed collection.
    pub fn load_durable(&self) -> Option<Vec<Quote>> {
        let raw = match self.durable.read(&self.keys.quotes) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No stored quotes under {}", self.keys.quotes);
                return None;
            }
            Err(e) => {
                warn!("Could not read stored quotes: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<StoredQuote>>(&raw) {
            Ok(stored) => Some(
                stored
                    .into_iter()
                    .map(|q| Quote::new(q.text, q.category))
                    .collect(),
            ),
            Err(e) => {
                warn!("Could not parse stored quotes: {}", e);
                None
            }
        }
    }

    /// Serialize and write the collection to the durable slot
    pub fn save_durable(&mut self, quotes: &[Quote]) -> StorageResult<()> {
        let json = serde_json::to_string(quotes).map_err(|source| StorageError::Encode {
            key: self.keys.quotes.clone(),
            source,
        })?;
        self.durable.write(&self.keys.quotes, &json)
    }

    /// Remove the stored collection
    pub fn clear_durable(&mut self) -> StorageResult<()> {
        self.durable.remove(&self.keys.quotes)
    }

    // ==================== Session slot ====================

    /// Last quote shown in this session
    pub fn load_last_quote(&self) -> Option<Quote> {
        let raw = self.read_session(&self.keys.last_quote)?;
        match serde_json::from_str::<StoredQuote>(&raw) {
            Ok(q) => Some(Quote::new(q.text, q.category)),
            Err(e) => {
                debug!("Ignoring unparsable last quote: {}", e);
                None
            }
        }
    }

    /// Record the quote most recently shown
    pub fn save_last_quote(&mut self, quote: &Quote) -> StorageResult<()> {
        let json = serde_json::to_string(quote).map_err(|source| StorageError::Encode {
            key: self.keys.last_quote.clone(),
            source,
        })?;
        self.session.write(&self.keys.last_quote, &json)
    }

    /// Last selected category filter value in this session
    pub fn load_last_category(&self) -> Option<String> {
        self.read_session(&self.keys.last_category)
    }

    /// Record the selected category filter value
    pub fn save_last_category(&mut self, value: &str) -> StorageResult<()> {
        self.session.write(&self.keys.last_category, value)
    }

    fn read_session(&self, key: &str) -> Option<String> {
        match self.session.read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Could not read session slot {}: {}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::seed_quotes;
    use tempfile::TempDir;

    fn memory_persistence() -> QuotePersistence {
        QuotePersistence::new("test", MemorySlots::new(), MemorySlots::new())
    }

    #[test]
    fn test_slot_keys_do_not_collide() {
        let keys = SlotKeys::for_app("quotegen");
        assert_eq!(keys.quotes, "quotegen_quotes");
        assert_eq!(keys.last_quote, "quotegen_last_quote");
        assert_eq!(keys.last_category, "quotegen_last_category");
        assert_ne!(keys.quotes, keys.last_quote);
        assert_ne!(keys.quotes, keys.last_category);
    }

    #[test]
    fn test_load_durable_absent() {
        let persistence = memory_persistence();
        assert!(persistence.load_durable().is_none());
    }

    #[test]
    fn test_durable_roundtrip_preserves_order() {
        let mut persistence = memory_persistence();
        let mut quotes = seed_quotes();
        quotes.push(Quote::new("Zeta", "Alpha"));
        quotes.push(Quote::new("Alpha", "Zeta"));

        persistence.save_durable(&quotes).unwrap();
        assert_eq!(persistence.load_durable().unwrap(), quotes);
    }

    #[test]
    fn test_durable_roundtrip_empty_collection() {
        let mut persistence = memory_persistence();
        persistence.save_durable(&[]).unwrap();
        assert_eq!(persistence.load_durable(), Some(Vec::new()));
    }

    #[test]
    fn test_load_durable_rejects_bad_payloads() {
        let payloads = [
            "not json",
            "{\"text\": \"a\", \"category\": \"b\"}",
            "[{\"text\": \"a\"}]",
            "[{\"text\": 1, \"category\": \"b\"}]",
            "[{\"text\": \"a\", \"category\": \"b\"}, null]",
        ];

        for payload in payloads {
            let mut durable = MemorySlots::new();
            durable.write("test_quotes", payload).unwrap();
            let persistence = QuotePersistence::new("test", durable, MemorySlots::new());
            assert!(
                persistence.load_durable().is_none(),
                "payload should be rejected: {}",
                payload
            );
        }
    }

    #[test]
    fn test_load_durable_ignores_extra_fields() {
        let mut durable = MemorySlots::new();
        durable
            .write(
                "test_quotes",
                r#"[{"text": "a", "category": "b", "author": "c"}]"#,
            )
            .unwrap();
        let persistence = QuotePersistence::new("test", durable, MemorySlots::new());
        assert_eq!(persistence.load_durable().unwrap(), vec![Quote::new("a", "b")]);
    }

    #[test]
    fn test_save_durable_quota_exceeded() {
        let mut persistence =
            QuotePersistence::new("test", MemorySlots::with_quota(16), MemorySlots::new());
        let err = persistence.save_durable(&seed_quotes()).unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }

    #[test]
    fn test_clear_durable() {
        let mut persistence = memory_persistence();
        persistence.save_durable(&seed_quotes()).unwrap();
        persistence.clear_durable().unwrap();
        assert!(persistence.load_durable().is_none());
    }

    #[test]
    fn test_session_values() {
        let mut persistence = memory_persistence();
        assert!(persistence.load_last_quote().is_none());
        assert!(persistence.load_last_category().is_none());

        let quote = Quote::new("A", "B");
        persistence.save_last_quote(&quote).unwrap();
        persistence.save_last_category("B").unwrap();

        assert_eq!(persistence.load_last_quote(), Some(quote));
        assert_eq!(persistence.load_last_category().as_deref(), Some("B"));

        // Session values never land in the durable slot
        assert!(persistence.load_durable().is_none());
    }

    #[test]
    fn test_file_backed_durable_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let quotes = vec![Quote::new("Persisted", "Disk")];

        {
            let mut persistence = QuotePersistence::new(
                "test",
                FileSlots::new(temp_dir.path()),
                MemorySlots::new(),
            );
            persistence.save_durable(&quotes).unwrap();
            persistence.save_last_category("Disk").unwrap();
        }

        let persistence =
            QuotePersistence::new("test", FileSlots::new(temp_dir.path()), MemorySlots::new());
        assert_eq!(persistence.load_durable().unwrap(), quotes);
        // Fresh session starts empty
        assert!(persistence.load_last_category().is_none());
    }
}
