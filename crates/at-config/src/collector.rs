//! Collector (delivery destination) configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default HTTP request timeout.
const fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectorConfig {
    /// Absolute URL batches are POSTed to. Empty means delivery is skipped.
    #[serde(default)]
    pub endpoint: String,

    /// Per-request timeout for the primary HTTP transport.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CollectorConfig {
    /// Check if a delivery destination is set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.is_configured()
            && !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://"))
        {
            return Err(ConfigError::invalid(
                "collector.endpoint",
                format!("'{}' is not an absolute http(s) URL", self.endpoint),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("collector.timeout_secs", "must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = CollectorConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn relative_endpoint_rejected() {
        let config = CollectorConfig {
            endpoint: "/collect".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "collector.endpoint"
        ));
    }
}
