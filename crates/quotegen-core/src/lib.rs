//! Quotegen Core Library
//!
//! Core functionality for quotegen, a categorized quote collection with
//! durable local storage and optional sync against a remote JSON endpoint.
//!
//! # Architecture
//!
//! - **Quote Store**: authoritative in-memory collection, single flush path
//! - **Persistence**: a durable slot for the collection and a session slot
//!   for the last viewed quote and selected filter
//! - **Category Index**: sorted distinct categories, recomputed on mutation
//! - **Sync Engine**: single-flight upload/fetch cycle, remote wins by text
//!
//! # Quick Start
//!
//! ```text
//! let app = QuoteApp::open(Config::load()?);
//!
//! app.add("Stay hungry.", "Life").await?;
//! let quote = app.show_random(Some("Life")).await?;
//! ```
//!
//! # Modules
//!
//! - `app`: command layer used by front ends (main entry point)
//! - `store`: the Quote Store
//! - `storage`: slot stores and the persistence adapter
//! - `categories`: category index and filter restoration
//! - `merge`: sync and import dedup policies
//! - `transfer`: JSON import/export
//! - `sync`: remote transport, sync engine and poller
//! - `config`: application configuration

pub mod app;
pub mod categories;
pub mod config;
pub mod error;
pub mod merge;
pub mod models;
pub mod storage;
pub mod store;
pub mod sync;
pub mod transfer;

pub use app::{AppStatus, ImportSummary, QuoteApp};
pub use categories::CategoryIndex;
pub use config::Config;
pub use error::{QuoteError, QuoteResult, TransportError};
pub use models::{CategoryFilter, Quote, ALL_CATEGORIES};
pub use storage::{QuotePersistence, StorageError};
pub use store::{Persisted, QuoteStore, SharedStore};
