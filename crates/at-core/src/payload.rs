//! Batch payload envelope posted to the collector.
//!
//! ```json
//! { "meta": { "sentAt": "...", "userAgent": "...", "language": "..." },
//!   "batch": [ActionRecord, ...] }
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::records::ActionRecord;

/// Send-time metadata attached to every batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMeta {
    /// ISO 8601 time the batch was serialized.
    pub sent_at: String,
    pub user_agent: String,
    pub language: String,
}

/// Owned form of the payload, as a collector would decode it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BatchPayload {
    pub meta: SendMeta,
    pub batch: Vec<ActionRecord>,
}

#[derive(Serialize)]
struct BatchPayloadRef<'a> {
    meta: &'a SendMeta,
    batch: &'a [ActionRecord],
}

/// Serialize a batch without taking ownership of its records.
///
/// # Errors
///
/// Returns [`CoreError::Serialization`] if JSON encoding fails.
pub fn serialize_batch(meta: &SendMeta, batch: &[ActionRecord]) -> Result<String, CoreError> {
    Ok(serde_json::to_string(&BatchPayloadRef { meta, batch })?)
}

/// JSON Schema of [`BatchPayload`] for collectors.
///
/// # Errors
///
/// Returns [`CoreError::Serialization`] if the generated schema cannot be
/// converted to a JSON value.
pub fn batch_payload_schema() -> Result<serde_json::Value, CoreError> {
    Ok(serde_json::to_value(schemars::schema_for!(BatchPayload))?)
}
