//! Persistence ports for the destination document collection.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Record, StoreSettings};
use crate::error::Result;

/// Bulk-insert side of the store.
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Insert `records` as one unit. Failure rejects the whole batch.
    async fn insert_batch(&self, records: &[Record]) -> Result<()>;
}

/// One connection to the destination collection.
///
/// A session is owned by exactly one invocation. The owner must call
/// [`close`](StoreSession::close) on every exit path once the session
/// exists, including after a failed [`connect`](StoreSession::connect);
/// closing twice is a no-op.
#[async_trait]
pub trait StoreSession: BatchSink {
    /// Establish the connection. Inserts and drops fail until this succeeds.
    async fn connect(&self) -> Result<()>;

    /// Remove every document from the collection.
    async fn drop_collection(&self) -> Result<()>;

    /// Release whatever the session acquired.
    async fn close(&self) -> Result<()>;
}

/// Factory for store sessions.
pub trait DocumentStore: Send + Sync {
    /// Create an unconnected session against the collection named by
    /// `settings`. Performs no I/O.
    fn session(&self, settings: &StoreSettings) -> Arc<dyn StoreSession>;
}
