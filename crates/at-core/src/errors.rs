//! Cross-cutting error types for the action tracker.
//!
//! Capability-specific errors (`StorageError`, `TransportError`) live in
//! `at-tracker`, configuration errors in `at-config`.

use thiserror::Error;

/// Errors that can be raised by any tracker crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A payload could not be serialized to JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The OS random source could not produce an identifier.
    #[error("Random source error: {0}")]
    Random(String),
}
