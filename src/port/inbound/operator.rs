//! Operator capability surface for inbound adapters.

use async_trait::async_trait;

use crate::domain::{BlobEvent, DropResponse, Outcome};

/// Use cases the CLI and HTTP adapters drive.
#[async_trait]
pub trait OrderOperator: Send + Sync {
    /// Handle one storage event and wait for its outcome.
    async fn ingest(&self, event: &BlobEvent) -> Outcome;

    /// Handle `event` in the background. The outcome is only logged.
    fn dispatch(&self, event: BlobEvent);

    /// Wait until every dispatched ingestion has finished.
    async fn drain(&self);

    /// Delete every document in the configured collection.
    async fn drop_orders(&self) -> DropResponse;
}
