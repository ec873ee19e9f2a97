//! Stream source port: where order files are read from.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::domain::{BlobSettings, ObjectName};
use crate::error::Result;

/// Forward-only byte stream of one object's contents.
///
/// Ends with `None` on end-of-stream; an `Err` item is a read failure.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Provider of raw object bytes.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Open `object` in the container named by `blob`.
    ///
    /// Returns `Ok(None)` when the object has no readable body (missing or
    /// deleted between event and fetch).
    async fn open(&self, blob: &BlobSettings, object: &ObjectName) -> Result<Option<ByteStream>>;
}
