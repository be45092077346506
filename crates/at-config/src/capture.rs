//! What gets captured from a tracked element.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_action_attribute() -> String {
    String::from("action-name")
}

fn default_attribute_prefix() -> String {
    String::from("data-")
}

const fn default_text_limit() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// Marker attribute that opts an element into tracking. Its value becomes
    /// the action name.
    #[serde(default = "default_action_attribute")]
    pub action_attribute: String,

    /// Attributes whose name starts with this prefix are copied verbatim.
    #[serde(default = "default_attribute_prefix")]
    pub attribute_prefix: String,

    /// Maximum characters of element text kept.
    #[serde(default = "default_text_limit")]
    pub text_limit: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            action_attribute: default_action_attribute(),
            attribute_prefix: default_attribute_prefix(),
            text_limit: default_text_limit(),
        }
    }
}

impl CaptureConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.action_attribute.is_empty() {
            return Err(ConfigError::invalid("capture.action_attribute", "must not be empty"));
        }
        if self.text_limit == 0 {
            return Err(ConfigError::invalid("capture.text_limit", "must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = CaptureConfig::default();
        assert_eq!(config.action_attribute, "action-name");
        assert_eq!(config.attribute_prefix, "data-");
        assert_eq!(config.text_limit, 100);
    }
}
