//! Buffer flush policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const fn default_flush_interval_ms() -> u64 {
    10_000
}

const fn default_max_batch_size() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchingConfig {
    /// Periodic flush cadence.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Buffer size that triggers an immediate flush.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: default_flush_interval_ms(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl BatchingConfig {
    /// Flush interval as a `Duration`, never zero.
    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }

    /// Batch threshold, never zero.
    #[must_use]
    pub fn batch_threshold(&self) -> usize {
        self.max_batch_size.max(1)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval_ms == 0 {
            return Err(ConfigError::invalid("batching.flush_interval_ms", "must be > 0"));
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::invalid("batching.max_batch_size", "must be > 0"));
        }
        Ok(())
    }
}
