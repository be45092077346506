//! Session and identity persistence settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 30 minutes.
const fn default_timeout_ms() -> u64 {
    30 * 60 * 1000
}

const fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_storage_key() -> String {
    String::from("at_user_id")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Inactivity window before the session id rotates.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How often inactivity is checked. Rotation lags by at most this much.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Persistent-store key of the durable user id.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            storage_key: default_storage_key(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as a `Duration`, never zero.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid("session.poll_interval_ms", "must be > 0"));
        }
        if self.storage_key.is_empty() {
            return Err(ConfigError::invalid("session.storage_key", "must not be empty"));
        }
        Ok(())
    }
}
