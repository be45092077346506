//! General tracker configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Emit lifecycle tracing (initialization, tracked actions, sends, rotations).
    #[serde(default)]
    pub debug: bool,

    /// Fixed user id. When set, the persistent store is not consulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}
