//! Error taxonomy for quote operations
//!
//! None of these are fatal: every variant maps to a status message the
//! caller can show while the in-memory collection stays authoritative.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by store, import and sync operations
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Empty text or category on add
    #[error("Invalid quote: {0}")]
    Validation(&'static str),

    /// No quotes match the active filter
    #[error("No quotes found for \"{filter}\"")]
    EmptyPool { filter: String },

    /// Durable or session slot failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Remote fetch or upload failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Malformed import payload
    #[error("Invalid import file: {0}")]
    ImportFormat(String),
}

/// Result type for quote operations
pub type QuoteResult<T> = Result<T, QuoteError>;

/// Errors talking to the remote quote collection
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request never produced a response (connect, timeout, DNS)
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-2xx status
    #[error("Server at {url} responded with status {status}")]
    Status { url: String, status: u16 },

    /// Response body was not the expected JSON
    #[error("Unexpected response from {url}: {details}")]
    Decode { url: String, details: String },

    /// Transport is not configured (no URL, sync disabled)
    #[error("Remote sync is not configured: {0}")]
    NotConfigured(String),
}
