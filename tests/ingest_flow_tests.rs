//! End-to-end ingestion through the real blob source and SQLite store.

mod support;

use std::collections::HashMap;
use std::sync::Arc;

use orderload::adapter::outbound::blob::ObjectStoreSource;
use orderload::adapter::outbound::sqlite::SqliteDocumentStore;
use orderload::domain::settings::STORE_URL_VAR;
use orderload::domain::{
    BlobEvent, IngestConfig, Outcome, Phase, Settings, SettingsLookup, SkipReason,
};
use orderload::error::Error;
use orderload::infrastructure::bootstrap::Services;
use orderload::port::OrderOperator;
use orderload::testkit::store::RecordingStore;
use orderload::testkit::{array_body, orders};
use support::fixture::{Workspace, CONTAINER};
use tokio_test::assert_ok;

fn env_map(ws: &Workspace) -> HashMap<String, String> {
    ws.env()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn lookup(ws: &Workspace) -> SettingsLookup {
    let map = env_map(ws);
    Arc::new(move |key: &str| map.get(key).cloned())
}

fn ingest_config(batch_size: usize) -> IngestConfig {
    IngestConfig {
        batch_size,
        max_pending_batches: 2,
        invocation_timeout_secs: 10,
        local_blob_root: None,
    }
}

fn services(ws: &Workspace, batch_size: usize) -> Services {
    Services::new(
        Arc::new(ObjectStoreSource::local(ws.blob_root())),
        Arc::new(SqliteDocumentStore::new()),
        lookup(ws),
        ingest_config(batch_size),
    )
}

#[tokio::test]
async fn blob_is_loaded_into_the_collection_in_order() {
    let ws = Workspace::new();
    let values = orders(250);
    ws.put_blob("2026/01/orders.json", array_body(&values));

    let outcome = services(&ws, 100)
        .ingest(&BlobEvent::blob_created(CONTAINER, "2026/01/orders.json"))
        .await;

    let report = outcome.report().expect("completed");
    assert_eq!(report.records_parsed, 250);
    assert_eq!(report.batches_written, 3);
    assert!(report.is_clean());
    assert_eq!(ws.stored(), values);
}

#[tokio::test]
async fn pretty_printed_blob_with_bom_is_accepted() {
    let ws = Workspace::new();
    let values = orders(5);
    let mut body = vec![0xEF, 0xBB, 0xBF];
    body.extend(serde_json::to_vec_pretty(&values).unwrap());
    ws.put_blob("pretty.json", body);

    let outcome = services(&ws, 2)
        .ingest(&BlobEvent::blob_created(CONTAINER, "pretty.json"))
        .await;

    assert!(outcome.report().is_some(), "unexpected outcome: {outcome}");
    assert_eq!(ws.stored(), values);
}

#[tokio::test]
async fn truncated_blob_keeps_flushed_batches() {
    let ws = Workspace::new();
    let mut body = array_body(&orders(5));
    body.truncate(body.len() - 1);
    body.extend_from_slice(br#",{"orderId":"#);
    ws.put_blob("broken.json", body);

    let outcome = services(&ws, 2)
        .ingest(&BlobEvent::blob_created(CONTAINER, "broken.json"))
        .await;

    assert!(matches!(
        outcome,
        Outcome::Aborted {
            phase: Phase::Streaming,
            error: Error::Parse(_)
        }
    ));
    assert_eq!(ws.stored(), orders(4));
}

#[tokio::test]
async fn missing_blob_aborts_without_writes() {
    let ws = Workspace::new();
    let store = RecordingStore::new();
    let services = Services::new(
        Arc::new(ObjectStoreSource::local(ws.blob_root())),
        Arc::new(store.clone()),
        lookup(&ws),
        ingest_config(10),
    );

    let outcome = services
        .ingest(&BlobEvent::blob_created(CONTAINER, "never-uploaded.json"))
        .await;

    assert!(matches!(
        outcome,
        Outcome::Aborted {
            error: Error::StreamUnavailable { .. },
            ..
        }
    ));
    assert_eq!(store.insert_calls(), 0);
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn other_container_is_skipped() {
    let ws = Workspace::new();
    ws.put_blob("orders.json", b"[1]");

    let outcome = services(&ws, 10)
        .ingest(&BlobEvent::blob_created("invoices", "orders.json"))
        .await;

    assert!(matches!(
        outcome,
        Outcome::Skipped(SkipReason::WrongContainer)
    ));
    assert!(ws.stored().is_empty());
}

#[tokio::test]
async fn drop_clears_what_ingest_wrote() {
    let ws = Workspace::new();
    ws.put_blob("orders.json", array_body(&orders(3)));
    let services = services(&ws, 10);

    services
        .ingest(&BlobEvent::blob_created(CONTAINER, "orders.json"))
        .await;
    assert_eq!(ws.stored().len(), 3);

    let response = services.drop_orders().await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "Orders Deleted");
    assert!(ws.stored().is_empty());
}

#[tokio::test]
async fn events_for_the_same_blob_append_again() {
    let ws = Workspace::new();
    ws.put_blob("orders.json", array_body(&orders(2)));
    let services = services(&ws, 10);
    let event = BlobEvent::blob_created(CONTAINER, "orders.json");

    services.dispatch(event.clone());
    services.dispatch(event);
    services.drain().await;

    assert_eq!(ws.stored().len(), 4);
}

#[tokio::test]
async fn unsupported_store_url_aborts_while_fetching() {
    let ws = Workspace::new();
    ws.put_blob("orders.json", b"[1]");
    let mut map = env_map(&ws);
    map.insert(STORE_URL_VAR.to_string(), "mongodb://localhost:27017".into());
    let settings = assert_ok!(Settings::from_lookup(|k| map.get(k).cloned()));
    assert_eq!(settings.store.url, "mongodb://localhost:27017");
    let services = Services::new(
        Arc::new(ObjectStoreSource::local(ws.blob_root())),
        Arc::new(SqliteDocumentStore::new()),
        Arc::new(move |key: &str| map.get(key).cloned()),
        ingest_config(10),
    );

    let outcome = services
        .ingest(&BlobEvent::blob_created(CONTAINER, "orders.json"))
        .await;

    assert!(matches!(
        outcome,
        Outcome::Aborted {
            phase: Phase::Fetching,
            error: Error::Connection(_)
        }
    ));
    assert!(ws.stored().is_empty());
}
