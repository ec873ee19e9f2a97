//! Connection values and pipeline tuning for one invocation.
//!
//! [`Settings`] holds the per-invocation connection values (store URL,
//! database, collection, blob account and container). They are secrets and
//! are resolved through a [`SettingsLookup`] at the start of each invocation,
//! so a missing value aborts that invocation alone.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::DEFAULT_BATCH_SIZE;
use crate::error::ConfigError;

/// Environment variable holding the store connection URL.
pub const STORE_URL_VAR: &str = "ORDERS_STORE_URL";
/// Environment variable holding the database name.
pub const DATABASE_VAR: &str = "ORDERS_DATABASE";
/// Environment variable holding the destination collection name.
pub const COLLECTION_VAR: &str = "ORDERS_COLLECTION";
pub const BLOB_ACCOUNT_NAME_VAR: &str = "BLOB_ACCOUNT_NAME";
pub const BLOB_ACCOUNT_KEY_VAR: &str = "BLOB_ACCOUNT_KEY";
pub const BLOB_CONTAINER_VAR: &str = "BLOB_CONTAINER";

/// All variables a [`Settings`] needs, in resolution order.
pub const REQUIRED_VARS: [&str; 6] = [
    STORE_URL_VAR,
    DATABASE_VAR,
    COLLECTION_VAR,
    BLOB_ACCOUNT_NAME_VAR,
    BLOB_ACCOUNT_KEY_VAR,
    BLOB_CONTAINER_VAR,
];

/// Source of setting values, keyed by variable name.
pub type SettingsLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Pipeline tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Records per batch.
    pub batch_size: usize,

    /// Full batches that may wait for the flush worker before decoding
    /// pauses.
    pub max_pending_batches: usize,

    /// Deadline for one invocation's fetch, decode and flush phases.
    pub invocation_timeout_secs: u64,

    /// Read blobs from `<root>/<container>/<object>` on the local filesystem
    /// instead of the blob service.
    pub local_blob_root: Option<PathBuf>,
}

impl IngestConfig {
    #[must_use]
    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_secs(self.invocation_timeout_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_pending_batches: 4,
            invocation_timeout_secs: 300,
            local_blob_root: None,
        }
    }
}

/// Destination store coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub url: String,
    pub database: String,
    pub collection: String,
}

/// Blob account coordinates.
#[derive(Clone, PartialEq, Eq)]
pub struct BlobSettings {
    pub account_name: String,
    pub account_key: String,
    pub container: String,
}

impl fmt::Debug for BlobSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobSettings")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("container", &self.container)
            .finish()
    }
}

/// Connection values for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: StoreSettings,
    pub blob: BlobSettings,
}

/// Fetch one required value. Values are trimmed; blank counts as missing.
fn required<F>(lookup: &F, field: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(field)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField { field })
}

impl StoreSettings {
    /// Resolve the store values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the first absent variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            url: required(&lookup, STORE_URL_VAR)?,
            database: required(&lookup, DATABASE_VAR)?,
            collection: required(&lookup, COLLECTION_VAR)?,
        })
    }
}

impl BlobSettings {
    /// Resolve the blob account values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the first absent variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            account_name: required(&lookup, BLOB_ACCOUNT_NAME_VAR)?,
            account_key: required(&lookup, BLOB_ACCOUNT_KEY_VAR)?,
            container: required(&lookup, BLOB_CONTAINER_VAR)?,
        })
    }
}

impl Settings {
    /// Resolve every required value through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the first absent variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            store: StoreSettings::from_lookup(&lookup)?,
            blob: BlobSettings::from_lookup(&lookup)?,
        })
    }
}
