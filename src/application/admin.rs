//! Administrative drop of the destination collection.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::{DropResponse, SettingsLookup, StoreSettings, DROP_FAILED_BODY};
use crate::error::ConfigError;
use crate::port::DocumentStore;

/// Delete every document in the configured collection.
///
/// Only the store settings are required. Once created, the session is closed
/// whether or not connecting and dropping succeeded.
pub async fn drop_orders(store: &Arc<dyn DocumentStore>, lookup: &SettingsLookup) -> DropResponse {
    let settings = match StoreSettings::from_lookup(lookup.as_ref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Drop rejected, configuration missing");
            return DropResponse::failed(missing_message(&e));
        }
    };

    let session = store.session(&settings);
    let dropped = match session.connect().await {
        Ok(()) => session.drop_collection().await,
        Err(e) => Err(e),
    };
    if let Err(e) = session.close().await {
        warn!(error = %e, "Failed to close store session");
    }

    match dropped {
        Ok(()) => {
            info!(
                database = %settings.database,
                collection = %settings.collection,
                "Collection dropped"
            );
            DropResponse::ok()
        }
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Drop failed");
            DropResponse::failed(DROP_FAILED_BODY)
        }
    }
}

fn missing_message(error: &ConfigError) -> String {
    match error {
        ConfigError::MissingField { field } => format!("Missing configuration: {field}"),
        other => format!("Missing configuration: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::{BLOB_CONTAINER_VAR, COLLECTION_VAR};
    use crate::testkit::config;
    use crate::testkit::store::RecordingStore;

    fn store(recording: &RecordingStore) -> Arc<dyn DocumentStore> {
        Arc::new(recording.clone())
    }

    #[tokio::test]
    async fn drop_succeeds_and_closes_session() {
        let recording = RecordingStore::new();

        let response = drop_orders(&store(&recording), &config::lookup()).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "Orders Deleted");
        assert_eq!(recording.drops(), 1);
        assert_eq!(recording.closes(), 1);
    }

    #[tokio::test]
    async fn missing_store_setting_is_a_500_without_connecting() {
        let recording = RecordingStore::new();

        let response =
            drop_orders(&store(&recording), &config::lookup_without(COLLECTION_VAR)).await;

        assert_eq!(response.status, 500);
        assert_eq!(
            response.body,
            format!("Missing configuration: {COLLECTION_VAR}")
        );
        assert!(recording.untouched());
    }

    #[tokio::test]
    async fn blob_settings_are_not_required() {
        let recording = RecordingStore::new();

        let response =
            drop_orders(&store(&recording), &config::lookup_without(BLOB_CONTAINER_VAR)).await;

        assert!(response.is_success());
    }

    #[tokio::test]
    async fn store_error_is_a_generic_500_and_still_closes() {
        let recording = RecordingStore::new().failing_drop();

        let response = drop_orders(&store(&recording), &config::lookup()).await;

        assert_eq!(response.status, 500);
        assert_eq!(response.body, "Failed to delete orders");
        assert_eq!(recording.closes(), 1);
    }

    #[tokio::test]
    async fn connect_failure_is_a_generic_500_and_still_closes() {
        let recording = RecordingStore::new().failing_connect();

        let response = drop_orders(&store(&recording), &config::lookup()).await;

        assert_eq!(response, DropResponse::failed(DROP_FAILED_BODY));
        assert_eq!(recording.drops(), 0);
        assert_eq!(recording.closes(), 1);
    }
}
