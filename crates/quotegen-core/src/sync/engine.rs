//! Sync engine
//!
//! Runs one sync cycle at a time against a `RemoteTransport`:
//!
//! ```text
//! Manual:   Idle -> Uploading -> Fetching -> Idle
//! Periodic: Idle -> Fetching -> Idle
//! ```
//!
//! A trigger that arrives while a cycle is in flight is dropped, not queued.
//! Fetched records are merged remote-wins-by-text into the store, which
//! flushes the result to the durable slot.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::transport::{HttpTransport, RemoteTransport};
use crate::config::Config;
use crate::error::TransportError;
use crate::merge::merge_remote_wins;
use crate::models::Quote;
use crate::store::SharedStore;

/// Where the engine is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Uploading,
    Fetching,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncPhase::Idle => write!(f, "idle"),
            SyncPhase::Uploading => write!(f, "uploading"),
            SyncPhase::Fetching => write!(f, "fetching"),
        }
    }
}

/// What started a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// User action: upload, then fetch whatever the upload outcome
    Manual,
    /// Timer tick: fetch only
    Periodic,
}

/// Textual status reported by a cycle step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Uploaded { count: usize },
    UploadFailed(String),
    FetchFailed(String),
    Synced { remote: usize, total: usize },
    /// Merge applied in memory but the durable flush failed
    SaveFailed(String),
}

impl SyncStatus {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SyncStatus::UploadFailed(_) | SyncStatus::FetchFailed(_) | SyncStatus::SaveFailed(_)
        )
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Uploaded { count } => write!(f, "Uploaded {} quote(s) to server", count),
            SyncStatus::UploadFailed(e) => write!(f, "Failed to upload quotes: {}", e),
            SyncStatus::FetchFailed(e) => write!(f, "Failed to fetch quotes from server: {}", e),
            SyncStatus::Synced { remote, total } => write!(
                f,
                "Quotes synced with server ({} from server, {} total)",
                remote, total
            ),
            SyncStatus::SaveFailed(e) => write!(f, "Synced quotes could not be saved: {}", e),
        }
    }
}

/// Events published while the engine runs
#[derive(Debug, Clone)]
pub enum SyncEvent {
    PhaseChanged(SyncPhase),
    Status(SyncStatus),
    /// The local collection was replaced by a merge
    CollectionUpdated,
    /// A trigger was dropped because a cycle was in flight
    Skipped(SyncTrigger),
}

/// Result of a trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another cycle was in flight; nothing was done
    Skipped,
    Completed(SyncReport),
}

/// Statuses produced by one completed cycle, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub trigger: SyncTrigger,
    pub statuses: Vec<SyncStatus>,
}

impl SyncReport {
    /// True when no step failed
    pub fn succeeded(&self) -> bool {
        !self.statuses.iter().any(SyncStatus::is_failure)
    }

    /// True when fetched records were merged into the store
    pub fn merged(&self) -> bool {
        self.statuses
            .iter()
            .any(|s| matches!(s, SyncStatus::Synced { .. }))
    }
}

/// Tunables for a sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// `_limit` sent with each fetch
    pub fetch_limit: usize,
    /// Category for remote records that carry none
    pub category_label: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            fetch_limit: 10,
            category_label: "Server".to_string(),
        }
    }
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch_limit: config.sync_fetch_limit,
            category_label: config.sync_category.clone(),
        }
    }
}

/// Single-flight sync engine over a shared store
pub struct SyncEngine {
    store: SharedStore,
    transport: Arc<dyn RemoteTransport>,
    settings: SyncSettings,
    /// Current phase; also the single-flight guard
    phase: watch::Sender<SyncPhase>,
    /// Phase receiver kept for external monitoring
    phase_rx: watch::Receiver<SyncPhase>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create an engine over `store` using `transport`
    pub fn new(
        store: SharedStore,
        transport: Arc<dyn RemoteTransport>,
        settings: SyncSettings,
    ) -> Self {
        let (phase, phase_rx) = watch::channel(SyncPhase::Idle);
        let (events, _) = broadcast::channel(64);

        Self {
            store,
            transport,
            settings,
            phase,
            phase_rx,
            events,
        }
    }

    /// Create an engine talking HTTP to the configured endpoint
    pub fn from_config(store: SharedStore, config: &Config) -> Result<Self, TransportError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(
            store,
            Arc::new(transport),
            SyncSettings::from_config(config),
        ))
    }

    /// Current phase
    pub fn phase(&self) -> SyncPhase {
        *self.phase_rx.borrow()
    }

    /// Subscribe to phase changes
    pub fn subscribe_phase(&self) -> watch::Receiver<SyncPhase> {
        self.phase_rx.clone()
    }

    /// Subscribe to status events
    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Remote endpoint description
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Run one sync cycle unless one is already in flight
    pub async fn trigger(&self, trigger: SyncTrigger) -> SyncOutcome {
        let first = match trigger {
            SyncTrigger::Manual => SyncPhase::Uploading,
            SyncTrigger::Periodic => SyncPhase::Fetching,
        };

        let Some(_flight) = self.begin(first) else {
            debug!("Sync already in progress, ignoring {:?} trigger", trigger);
            self.emit(SyncEvent::Skipped(trigger));
            return SyncOutcome::Skipped;
        };
        info!("Starting {:?} sync with {}", trigger, self.endpoint());

        let mut statuses = Vec::new();

        if trigger == SyncTrigger::Manual {
            statuses.push(self.upload().await);
            self.set_phase(SyncPhase::Fetching);
        }
        statuses.extend(self.fetch_and_merge().await);

        for status in &statuses {
            if status.is_failure() {
                warn!("{}", status);
            } else {
                info!("{}", status);
            }
        }

        SyncOutcome::Completed(SyncReport { trigger, statuses })
    }

    /// Move from Idle to `first` atomically; `None` if not Idle
    fn begin(&self, first: SyncPhase) -> Option<FlightGuard<'_>> {
        let started = self.phase.send_if_modified(|phase| {
            if *phase == SyncPhase::Idle {
                *phase = first;
                true
            } else {
                false
            }
        });

        if started {
            self.emit(SyncEvent::PhaseChanged(first));
            Some(FlightGuard { engine: self })
        } else {
            None
        }
    }

    async fn upload(&self) -> SyncStatus {
        // Snapshot under the lock; the request runs without holding it
        let snapshot: Vec<Quote> = self.store.lock().await.quotes().to_vec();

        let status = match self.transport.upload(&snapshot).await {
            Ok(()) => SyncStatus::Uploaded {
                count: snapshot.len(),
            },
            Err(e) => SyncStatus::UploadFailed(e.to_string()),
        };
        self.emit(SyncEvent::Status(status.clone()));
        status
    }

    async fn fetch_and_merge(&self) -> Vec<SyncStatus> {
        let records = match self.transport.fetch(self.settings.fetch_limit).await {
            Ok(records) => records,
            Err(e) => {
                let status = SyncStatus::FetchFailed(e.to_string());
                self.emit(SyncEvent::Status(status.clone()));
                return vec![status];
            }
        };

        let fetched = records.len();
        let remote: Vec<Quote> = records
            .into_iter()
            .filter_map(|r| r.into_quote(&self.settings.category_label))
            .collect();
        if remote.len() < fetched {
            debug!("Skipped {} untitled remote records", fetched - remote.len());
        }

        let mut statuses = Vec::new();
        {
            let mut store = self.store.lock().await;
            let merged = merge_remote_wins(store.quotes(), &remote);
            let persisted = store.replace_all(merged);

            statuses.push(SyncStatus::Synced {
                remote: remote.len(),
                total: store.len(),
            });
            if let Err(e) = persisted.flush {
                statuses.push(SyncStatus::SaveFailed(e.to_string()));
            }
        }

        self.emit(SyncEvent::CollectionUpdated);
        for status in &statuses {
            self.emit(SyncEvent::Status(status.clone()));
        }
        statuses
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.phase.send_replace(phase);
        self.emit(SyncEvent::PhaseChanged(phase));
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.send(event);
    }
}

/// Returns the engine to Idle when the cycle ends, even on panic
struct FlightGuard<'a> {
    engine: &'a SyncEngine,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.engine.set_phase(SyncPhase::Idle);
    }
}
