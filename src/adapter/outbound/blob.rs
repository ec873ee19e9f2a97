//! Blob stream source backed by the `object_store` crate.
//!
//! Production reads Azure Blob Storage with the account name and key from
//! the invocation settings. A local directory tree can stand in for the
//! account during development: `<root>/<container>/<object>`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use object_store::azure::MicrosoftAzureBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path;
use object_store::ObjectStore;
use tracing::debug;

use crate::domain::{BlobSettings, ObjectName};
use crate::error::{Error, Result};
use crate::port::{ByteStream, StreamSource};

/// Where blobs are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobBackend {
    /// Azure Blob Storage, addressed by the settings' account and container.
    Azure,
    /// Local directory holding one subdirectory per container.
    Local(PathBuf),
}

/// [`StreamSource`] over an object store.
#[derive(Debug, Clone)]
pub struct ObjectStoreSource {
    backend: BlobBackend,
}

impl ObjectStoreSource {
    pub fn new(backend: BlobBackend) -> Self {
        Self { backend }
    }

    pub fn azure() -> Self {
        Self::new(BlobBackend::Azure)
    }

    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(BlobBackend::Local(root.into()))
    }

    /// Build the store for `blob`'s container. `None` when a local container
    /// directory does not exist.
    fn store_for(&self, blob: &BlobSettings) -> Result<Option<Arc<dyn ObjectStore>>> {
        match &self.backend {
            BlobBackend::Azure => {
                let store = MicrosoftAzureBuilder::new()
                    .with_account(&blob.account_name)
                    .with_access_key(&blob.account_key)
                    .with_container_name(&blob.container)
                    .build()?;
                Ok(Some(Arc::new(store)))
            }
            BlobBackend::Local(root) => {
                let dir = root.join(&blob.container);
                if !dir.is_dir() {
                    return Ok(None);
                }
                let store = LocalFileSystem::new_with_prefix(dir)?;
                Ok(Some(Arc::new(store)))
            }
        }
    }
}

#[async_trait]
impl StreamSource for ObjectStoreSource {
    async fn open(&self, blob: &BlobSettings, object: &ObjectName) -> Result<Option<ByteStream>> {
        let Some(store) = self.store_for(blob)? else {
            debug!(container = %blob.container, "Container not found");
            return Ok(None);
        };
        let location = Path::parse(object.as_str())
            .map_err(|e| Error::Source(format!("invalid object name {object}: {e}")))?;

        match store.get(&location).await {
            Ok(result) => {
                debug!(
                    container = %blob.container,
                    object = %object,
                    size = result.meta.size,
                    "Blob opened"
                );
                Ok(Some(result.into_stream().map_err(Error::from).boxed()))
            }
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::config;
    use bytes::Bytes;

    async fn collect(stream: ByteStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn local_backend_streams_object_bytes() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(config::CONTAINER).join("2024");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("orders.json"), br#"[{"orderId":1}]"#).unwrap();

        let source = ObjectStoreSource::local(root.path());
        let stream = source
            .open(&config::settings().blob, &ObjectName::new("2024/orders.json"))
            .await
            .unwrap()
            .expect("object exists");

        assert_eq!(collect(stream).await, br#"[{"orderId":1}]"#.to_vec());
    }

    #[tokio::test]
    async fn missing_object_is_none() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join(config::CONTAINER)).unwrap();

        let source = ObjectStoreSource::local(root.path());
        let opened = source
            .open(&config::settings().blob, &ObjectName::new("absent.json"))
            .await
            .unwrap();

        assert!(opened.is_none());
    }

    #[tokio::test]
    async fn missing_container_directory_is_none() {
        let root = tempfile::tempdir().unwrap();

        let source = ObjectStoreSource::local(root.path());
        let opened = source
            .open(&config::settings().blob, &ObjectName::new("orders.json"))
            .await
            .unwrap();

        assert!(opened.is_none());
    }

    #[test]
    fn azure_store_builds_from_settings_without_network() {
        let source = ObjectStoreSource::azure();
        let store = source.store_for(&config::settings().blob).unwrap();
        assert!(store.is_some());
    }
}
