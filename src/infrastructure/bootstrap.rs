//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::adapter::outbound::blob::ObjectStoreSource;
use crate::adapter::outbound::sqlite::SqliteDocumentStore;
use crate::application::admin;
use crate::application::orchestrator::Ingestor;
use crate::domain::{BlobEvent, DropResponse, IngestConfig, Outcome, SettingsLookup};
use crate::infrastructure::config::settings::{env_lookup, Config};
use crate::port::{DocumentStore, OrderOperator, StreamSource};

/// Build the blob source selected by configuration.
pub fn build_source(config: &IngestConfig) -> Arc<dyn StreamSource> {
    match &config.local_blob_root {
        Some(root) => {
            info!(root = %root.display(), "Reading blobs from local directory");
            Arc::new(ObjectStoreSource::local(root))
        }
        None => Arc::new(ObjectStoreSource::azure()),
    }
}

/// Build the destination document store.
pub fn build_store() -> Arc<dyn DocumentStore> {
    Arc::new(SqliteDocumentStore::new())
}

/// Collaborators shared by the CLI and HTTP entry points.
///
/// Clones share the set of background ingestions, so any clone can
/// [`drain`](OrderOperator::drain) work another clone dispatched. Dropping
/// the last clone aborts ingestions still running.
#[derive(Clone)]
pub struct Services {
    ingestor: Arc<Ingestor>,
    store: Arc<dyn DocumentStore>,
    lookup: SettingsLookup,
    in_flight: Arc<Mutex<JoinSet<Outcome>>>,
}

impl Services {
    /// Production wiring: configured blob source, SQLite store, process
    /// environment for settings.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            build_source(&config.ingest),
            build_store(),
            env_lookup(),
            config.ingest.clone(),
        )
    }

    pub fn new(
        source: Arc<dyn StreamSource>,
        store: Arc<dyn DocumentStore>,
        lookup: SettingsLookup,
        ingest: IngestConfig,
    ) -> Self {
        let ingestor = Arc::new(Ingestor::new(
            source,
            Arc::clone(&store),
            Arc::clone(&lookup),
            ingest,
        ));
        Self {
            ingestor,
            store,
            lookup,
            in_flight: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Background ingestions not yet reaped.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }
}

#[async_trait]
impl OrderOperator for Services {
    async fn ingest(&self, event: &BlobEvent) -> Outcome {
        self.ingestor.handle(event).await
    }

    fn dispatch(&self, event: BlobEvent) {
        let ingestor = Arc::clone(&self.ingestor);
        let mut tasks = self.in_flight.lock();
        // reap finished ingestions so the set only holds running ones
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move { ingestor.handle(&event).await });
    }

    async fn drain(&self) {
        let mut tasks = std::mem::take(&mut *self.in_flight.lock());
        if tasks.is_empty() {
            return;
        }
        info!(pending = tasks.len(), "Waiting for background ingestions");
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => debug!(%outcome, "Background ingestion finished"),
                Err(e) => error!(error = %e, "Background ingestion task failed"),
            }
        }
    }

    async fn drop_orders(&self) -> DropResponse {
        admin::drop_orders(&self.store, &self.lookup).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::config;
    use crate::testkit::source::ChunkedSource;
    use crate::testkit::store::RecordingStore;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    fn services(source: ChunkedSource, store: &RecordingStore) -> Services {
        Services::new(
            Arc::new(source),
            Arc::new(store.clone()),
            config::lookup(),
            config::ingest(2),
        )
    }

    #[tokio::test]
    async fn ingest_reports_outcome() {
        let source = ChunkedSource::new().with_object("a.json", b"[1,2,3]", 2);
        let store = RecordingStore::new();

        let outcome = services(source, &store)
            .ingest(&BlobEvent::blob_created(config::CONTAINER, "a.json"))
            .await;

        assert_eq!(outcome.report().unwrap().records_written, 3);
        assert_eq!(store.attempt_sizes(), vec![2, 1]);
    }

    #[tokio::test]
    async fn drain_waits_for_dispatched_ingestions() {
        let gate = Arc::new(Semaphore::new(0));
        let source = ChunkedSource::new().with_object("a.json", b"[1,2,3]", 4);
        let store = RecordingStore::new().with_gate(Arc::clone(&gate));
        let services = services(source, &store);

        services.dispatch(BlobEvent::blob_created(config::CONTAINER, "a.json"));
        assert_eq!(services.in_flight(), 1);

        let draining = tokio::spawn({
            let services = services.clone();
            async move { services.drain().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!draining.is_finished());
        assert_eq!(store.closes(), 0);

        gate.add_permits(2);
        draining.await.unwrap();

        assert_eq!(store.written_records().len(), 3);
        assert_eq!(store.closes(), 1);
        assert_eq!(services.in_flight(), 0);
    }

    #[tokio::test]
    async fn dispatch_reaps_finished_ingestions() {
        let source = ChunkedSource::new().with_object("a.json", b"[1]", 4);
        let store = RecordingStore::new();
        let services = services(source, &store);
        let event = BlobEvent::blob_created(config::CONTAINER, "a.json");

        services.dispatch(event.clone());
        tokio::time::timeout(Duration::from_secs(2), async {
            while store.closes() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        // the close happens just before the task returns
        tokio::time::sleep(Duration::from_millis(20)).await;

        services.dispatch(event);
        assert_eq!(services.in_flight(), 1);
        services.drain().await;
        assert_eq!(store.closes(), 2);
    }

    #[tokio::test]
    async fn drop_uses_shared_store() {
        let store = RecordingStore::new();

        assert!(services(ChunkedSource::new(), &store)
            .drop_orders()
            .await
            .is_success());
        assert_eq!(store.drops(), 1);
    }
}
