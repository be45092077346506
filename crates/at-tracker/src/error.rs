//! Capability error types.
//!
//! None of these escape the tracker's public operations: storage failures
//! degrade to an ephemeral identifier and delivery failures restore the batch.

use thiserror::Error;

/// Errors from a persistent key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store is disabled or cannot be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON string map.
    #[error("storage data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors from the primary delivery transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP transport error (connect, timeout, client build).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Collector returned a non-success status code.
    #[error("collector error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the collector.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The transport refused the request before sending it.
    #[error("request rejected: {0}")]
    Rejected(String),
}
