//! Canonical test configurations.
//!
//! Single source of truth for settings used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::settings::{
    BLOB_ACCOUNT_KEY_VAR, BLOB_ACCOUNT_NAME_VAR, BLOB_CONTAINER_VAR, COLLECTION_VAR, DATABASE_VAR,
    STORE_URL_VAR,
};
use crate::domain::{IngestConfig, Settings, SettingsLookup};

/// Container every test event targets.
pub const CONTAINER: &str = "orders";

/// Variable map with every required setting present.
pub fn env_map() -> HashMap<String, String> {
    [
        (STORE_URL_VAR, "memory://orders"),
        (DATABASE_VAR, "shop"),
        (COLLECTION_VAR, "orders"),
        (BLOB_ACCOUNT_NAME_VAR, "devaccount"),
        (BLOB_ACCOUNT_KEY_VAR, "ZGV2a2V5"),
        (BLOB_CONTAINER_VAR, CONTAINER),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Lookup over a fixed map.
pub fn lookup_from(map: HashMap<String, String>) -> SettingsLookup {
    Arc::new(move |key: &str| map.get(key).cloned())
}

/// Lookup with every required setting present.
pub fn lookup() -> SettingsLookup {
    lookup_from(env_map())
}

/// Lookup with `missing` removed.
pub fn lookup_without(missing: &str) -> SettingsLookup {
    let mut map = env_map();
    map.remove(missing);
    lookup_from(map)
}

/// Resolved settings matching [`lookup`].
pub fn settings() -> Settings {
    let map = env_map();
    Settings::from_lookup(|k| map.get(k).cloned()).expect("test settings are complete")
}

/// Pipeline tuning with a small batch size.
pub fn ingest(batch_size: usize) -> IngestConfig {
    IngestConfig {
        batch_size,
        max_pending_batches: 2,
        invocation_timeout_secs: 5,
        local_blob_root: None,
    }
}
