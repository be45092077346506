//! Action records and the snapshots they carry.
//!
//! Field names serialize in camelCase to match the collector's JSON contract.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Action name used when the marker attribute is present but empty.
pub const UNNAMED_ACTION: &str = "unnamed";

/// Record type tag for captured clicks.
pub const CLICK: &str = "click";

/// Record type tag for actions reported by the embedder rather than observed.
pub const CUSTOM: &str = "custom";

/// The tracked element at capture time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ElementSnapshot {
    /// Lowercased tag name.
    pub tag: String,
    pub id: Option<String>,
    /// Raw class-list string.
    pub classes: Option<String>,
    /// Trimmed, truncated text content.
    pub text: String,
    /// Custom attributes selected by the capture policy.
    pub attributes: BTreeMap<String, String>,
}

/// Pointer details of the triggering interaction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct InteractionSnapshot {
    pub x: f64,
    pub y: f64,
    /// Lowercased tag of the element the host reported as the event target.
    pub target: String,
}

/// Page state, read fresh at enrichment time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub path: String,
    pub referrer: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

/// An observation before enrichment with identity and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedAction {
    pub kind: String,
    pub action_name: String,
    pub element: ElementSnapshot,
    pub event: Option<InteractionSnapshot>,
    pub page: PageSnapshot,
}

impl TrackedAction {
    /// An action with no element or pointer behind it.
    #[must_use]
    pub fn custom(action_name: impl Into<String>, page: PageSnapshot) -> Self {
        Self {
            kind: CUSTOM.to_string(),
            action_name: action_name.into(),
            element: ElementSnapshot::default(),
            event: None,
            page,
        }
    }

    /// Stamp the action with identity and capture time.
    #[must_use]
    pub fn enrich(
        self,
        timestamp: String,
        user_id: &str,
        session_id: &str,
        device_id: &str,
    ) -> ActionRecord {
        ActionRecord {
            kind: self.kind,
            action_name: self.action_name,
            timestamp,
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            device_id: device_id.to_string(),
            element: self.element,
            event: self.event,
            page: self.page,
        }
    }
}

/// One enriched, immutable observation of a tracked interaction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// Record type tag, e.g. `"click"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub action_name: String,
    /// ISO 8601 timestamp assigned at enrichment.
    pub timestamp: String,
    pub user_id: String,
    pub session_id: String,
    pub device_id: String,
    pub element: ElementSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<InteractionSnapshot>,
    pub page: PageSnapshot,
}
