//! Application configuration loading and validation.
//!
//! [`Config`] is the process-wide tuning loaded once from an optional TOML
//! file (logging, HTTP listener, batch sizing, deadlines). Per-invocation
//! connection values come only from the environment through [`env_lookup`].
//!
//! # Example
//!
//! ```no_run
//! use orderload::domain::Settings;
//! use orderload::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default("orderload.toml")?;
//!     config.init_logging();
//!     let settings = Settings::from_lookup(|key| std::env::var(key).ok())?;
//!     println!("{}", settings.store.collection);
//!     Ok(())
//! }
//! ```

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::domain::{IngestConfig, SettingsLookup};
use crate::error::{ConfigError, Result};

/// Lookup backed by the process environment.
#[must_use]
pub fn env_lookup() -> SettingsLookup {
    Arc::new(|key: &str| std::env::var(key).ok())
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address for the webhook and admin endpoints.
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:7071".into(),
        }
    }
}

/// Main application configuration.
///
/// Every section is optional; an absent file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Batch sizing and deadlines.
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or fails
    /// validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than the file not existing.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse_toml(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::ReadFile(e).into()),
        }
    }

    /// Initialize the global tracing subscriber.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    fn validate(&self) -> Result<()> {
        if self.ingest.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.ingest.max_pending_batches == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_pending_batches",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.ingest.invocation_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "invocation_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.server.listen.is_empty() {
            return Err(ConfigError::MissingField { field: "listen" }.into());
        }
        Ok(())
    }
}
