//! Storage layer
//!
//! Handles persistence of the quote collection and session values.
//!
//! ## Architecture
//!
//! - **Durable slot**: survives restarts, holds the serialized collection
//! - **Session slot**: lives for one session, holds the last viewed quote
//!   and the last selected category
//!
//! Both are `SlotStore`s; `QuotePersistence` owns one of each and never
//! mixes keys between them.

pub mod error;
pub mod persistence;
pub mod slots;

pub use error::{StorageError, StorageResult};
pub use persistence::{QuotePersistence, SlotKeys};
pub use slots::{FileSlots, MemorySlots, SlotStore};
