//! Command layer
//!
//! `QuoteApp` is what a front end talks to: it issues intents against the
//! shared store and the optional sync engine and returns results or typed
//! errors for the caller to render. It never prints.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{QuoteError, QuoteResult, TransportError};
use crate::merge::merge_import;
use crate::models::{CategoryFilter, Quote};
use crate::storage::{QuotePersistence, StorageError};
use crate::store::{Persisted, QuoteStore, SharedStore, StoreOrigin};
use crate::sync::{SyncEngine, SyncOutcome, SyncTrigger};
use crate::transfer::{check_import_path, export_file_name, export_json, parse_import};

/// Result of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Valid quotes found in the file
    pub read: usize,
    /// Quotes not already present by text + category
    pub added: usize,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!("Imported {} new quote(s).", self.added)
    }
}

/// Snapshot for the `status` command
#[derive(Debug, Clone, Serialize)]
pub struct AppStatus {
    pub quotes: usize,
    pub categories: Vec<String>,
    pub seeded: bool,
    pub active_filter: String,
    pub slot_dir: PathBuf,
    pub sync_enabled: bool,
    pub sync_url: String,
    pub sync_phase: Option<String>,
}

/// Front-end facing operations over the quote store
pub struct QuoteApp {
    config: Config,
    store: SharedStore,
    sync: Option<Arc<SyncEngine>>,
}

impl QuoteApp {
    /// Open with file-backed durable and session slots
    ///
    /// Sync is attached when enabled in config and the transport can be
    /// built; a transport error only disables sync.
    pub fn open(config: Config) -> Self {
        let store = QuoteStore::open(QuotePersistence::from_config(&config));
        Self::with_store(config, store)
    }

    /// Open with an in-memory session slot (one session per process)
    pub fn open_interactive(config: Config) -> Self {
        let store = QuoteStore::open(QuotePersistence::with_memory_session(&config));
        Self::with_store(config, store)
    }

    /// Wrap an already opened store
    pub fn with_store(config: Config, store: QuoteStore) -> Self {
        let store = store.into_shared();
        let sync = if config.sync_enabled {
            match SyncEngine::from_config(store.clone(), &config) {
                Ok(engine) => Some(Arc::new(engine)),
                Err(e) => {
                    warn!("Sync disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            config,
            store,
            sync,
        }
    }

    /// Replace the sync engine
    pub fn with_sync(mut self, engine: Arc<SyncEngine>) -> Self {
        self.sync = Some(engine);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn sync_engine(&self) -> Option<&Arc<SyncEngine>> {
        self.sync.as_ref()
    }

    // ==================== Queries ====================

    /// Pick a random quote and record it as last viewed
    ///
    /// With no explicit filter the saved session filter is used.
    pub async fn show_random(&self, filter: Option<&str>) -> QuoteResult<Quote> {
        let mut store = self.store.lock().await;
        let filter = match filter {
            Some(value) => CategoryFilter::from_value(value),
            None => store.restore_filter(),
        };

        let quote = store.pick_random(&filter)?;
        if let Err(e) = store.record_viewed(&quote) {
            warn!("Failed to record last viewed quote: {}", e);
        }
        Ok(quote)
    }

    /// Quotes matching `filter` (or the saved filter), with the filter used
    pub async fn list(&self, filter: Option<&str>) -> (CategoryFilter, Vec<Quote>) {
        let store = self.store.lock().await;
        let filter = match filter {
            Some(value) => CategoryFilter::from_value(value),
            None => store.restore_filter(),
        };
        let quotes = store.list(&filter);
        (filter, quotes)
    }

    /// Selector options: `all` followed by the sorted categories
    pub async fn categories(&self) -> Vec<String> {
        let store = self.store.lock().await;
        store
            .categories()
            .options()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Last quote shown in this session
    pub async fn last_viewed(&self) -> Option<Quote> {
        self.store.lock().await.last_viewed()
    }

    /// Effective session filter after restoration
    pub async fn last_filter(&self) -> CategoryFilter {
        self.store.lock().await.restore_filter()
    }

    // ==================== Mutations ====================

    /// Add a quote from user input
    pub async fn add(&self, text: &str, category: &str) -> QuoteResult<Persisted<Quote>> {
        let added = self.store.lock().await.add(text, category)?;
        info!("Added quote in \"{}\"", added.value.category);
        Ok(added)
    }

    /// Select and remember a filter
    ///
    /// A category not in the index resolves to `all`; the resolved filter is
    /// what gets saved and returned.
    pub async fn select_filter(&self, value: &str) -> Persisted<CategoryFilter> {
        let mut store = self.store.lock().await;
        let filter = store.categories().restore(Some(value));
        let flush = store.select_filter(&filter);
        Persisted {
            value: filter,
            flush,
        }
    }

    /// Drop the stored collection and go back to the seed quotes
    pub async fn clear_and_reseed(&self) -> Persisted<usize> {
        let mut store = self.store.lock().await;
        let reset = store.reset();
        info!("Collection reset to {} seed quotes", store.len());
        Persisted {
            value: store.len(),
            flush: reset.flush,
        }
    }

    // ==================== Import / export ====================

    /// Write the collection as JSON
    ///
    /// A directory target gets a timestamped file name inside it. Returns
    /// the written path.
    pub async fn export(&self, target: &Path) -> QuoteResult<PathBuf> {
        let is_dir = tokio::fs::metadata(target)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        let path = if is_dir {
            target.join(export_file_name(Utc::now()))
        } else {
            target.to_path_buf()
        };

        let json = {
            let store = self.store.lock().await;
            export_json(store.quotes()).map_err(|source| StorageError::Encode {
                key: path.display().to_string(),
                source,
            })?
        };

        tokio::fs::write(&path, json)
            .await
            .map_err(|e| StorageError::from_io(e, path.clone()))?;
        debug!("Exported collection to {:?}", path);
        Ok(path)
    }

    /// Merge a JSON file into the collection, deduplicating by
    /// text + category
    ///
    /// The file is rejected as a whole on any format problem.
    pub async fn import(&self, path: &Path) -> QuoteResult<Persisted<ImportSummary>> {
        check_import_path(path)?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StorageError::from_read(e, path.to_path_buf()))?;
        let incoming = parse_import(&content)?;

        let mut store = self.store.lock().await;
        let (merged, added) = merge_import(store.quotes(), &incoming);
        let summary = ImportSummary {
            read: incoming.len(),
            added,
        };

        let flush = if added > 0 {
            store.replace_all(merged).flush
        } else {
            Ok(())
        };
        info!("{}", summary.message());

        Ok(Persisted {
            value: summary,
            flush,
        })
    }

    // ==================== Sync ====================

    /// Run a manual sync cycle
    pub async fn sync_now(&self) -> QuoteResult<SyncOutcome> {
        let engine = self.sync.as_ref().ok_or_else(|| {
            QuoteError::Transport(TransportError::NotConfigured(
                "enable it with `config set sync_enabled true`".to_string(),
            ))
        })?;
        Ok(engine.trigger(SyncTrigger::Manual).await)
    }

    pub async fn status(&self) -> AppStatus {
        let store = self.store.lock().await;
        AppStatus {
            quotes: store.len(),
            categories: store.categories().categories().to_vec(),
            seeded: store.origin() == StoreOrigin::Seeded,
            active_filter: store.restore_filter().to_string(),
            slot_dir: self.config.durable_slot_dir(),
            sync_enabled: self.config.sync_enabled,
            sync_url: self.config.sync_url.clone(),
            sync_phase: self.sync.as_ref().map(|e| e.phase().to_string()),
        }
    }
}
