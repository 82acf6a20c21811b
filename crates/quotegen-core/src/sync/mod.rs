//! Remote sync
//!
//! Keeps the local collection in step with a remote JSON endpoint.
//!
//! - `transport`: HTTP access to the remote collection
//! - `engine`: single-flight upload/fetch/merge cycle
//! - `poller`: background task firing periodic cycles
//!
//! Merging is last-writer-wins keyed by quote text: on a text collision the
//! remote record replaces the local one, whatever its category.

pub(crate) mod engine;
mod poller;
mod transport;

pub use engine::{
    SyncEngine, SyncEvent, SyncOutcome, SyncPhase, SyncReport, SyncSettings, SyncStatus,
    SyncTrigger,
};
pub use poller::{spawn_sync_poller, SyncCommand, SyncHandle};
pub use transport::{HttpTransport, RemoteRecord, RemoteTransport};
