//! # at-config
//!
//! Layered configuration loading for the action tracker using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`ACTION_TRACKER_*` prefix, `__` as separator)
//! 2. Project-level `.action-tracker/config.toml`
//! 3. User-level `~/.config/action-tracker/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `ACTION_TRACKER_COLLECTOR__ENDPOINT` -> `collector.endpoint`,
//! `ACTION_TRACKER_BATCHING__MAX_BATCH_SIZE` -> `batching.max_batch_size`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use at_config::TrackerConfig;
//!
//! let config = TrackerConfig::load_with_dotenv().expect("config");
//!
//! if config.collector.is_configured() {
//!     println!("Collector: {}", config.collector.endpoint);
//! }
//! ```

mod batching;
mod capture;
mod collector;
mod error;
mod general;
mod session;

pub use batching::BatchingConfig;
pub use capture::CaptureConfig;
pub use collector::CollectorConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use session::SessionConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix for all tracker settings.
pub const ENV_PREFIX: &str = "ACTION_TRACKER_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub batching: BatchingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl TrackerConfig {
    /// Defaults with a delivery destination set.
    #[must_use]
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.collector.endpoint = endpoint.into();
        config
    }

    /// Load configuration from all sources (TOML files + environment variables)
    /// and validate it.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source cannot be parsed or
    /// extracted, and [`ConfigError::InvalidValue`] if validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and embedders can add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".action-tracker/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check every section for values the tracker cannot run with.
    ///
    /// An empty endpoint is valid: delivery is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collector.validate()?;
        self.batching.validate()?;
        self.session.validate()?;
        self.capture.validate()?;
        Ok(())
    }

    /// Require a delivery destination.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when `collector.endpoint` is empty.
    pub fn require_endpoint(&self) -> Result<&str, ConfigError> {
        if self.collector.is_configured() {
            Ok(&self.collector.endpoint)
        } else {
            Err(ConfigError::NotConfigured {
                section: "collector".to_string(),
            })
        }
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("action-tracker").join("config.toml"))
    }
}
