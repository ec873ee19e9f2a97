//! Scripted [`StreamSource`] implementation for testing.
//!
//! Each object is a list of [`Step`]s replayed on every open: data chunks,
//! a mid-stream read failure, or a stall that never yields.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{future, stream, StreamExt};
use parking_lot::Mutex;

use crate::domain::{BlobSettings, ObjectName};
use crate::error::{Error, Result};
use crate::port::{ByteStream, StreamSource};

/// One scripted stream element.
#[derive(Debug, Clone)]
pub enum Step {
    Chunk(Bytes),
    Fail(String),
    /// Never yield again.
    Stall,
}

#[derive(Default)]
struct Scripted {
    objects: Mutex<HashMap<String, Vec<Step>>>,
    opened: Mutex<Vec<(String, String)>>,
    fail_open: Mutex<Option<String>>,
}

/// Source double keyed by object name. Clones share state.
#[derive(Clone, Default)]
pub struct ChunkedSource {
    state: Arc<Scripted>,
}

impl ChunkedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` split into chunks of `chunk_size` bytes.
    pub fn with_object(self, name: &str, body: impl AsRef<[u8]>, chunk_size: usize) -> Self {
        let steps = body
            .as_ref()
            .chunks(chunk_size.max(1))
            .map(|c| Step::Chunk(Bytes::copy_from_slice(c)))
            .collect();
        self.with_steps(name, steps)
    }

    pub fn with_steps(self, name: &str, steps: Vec<Step>) -> Self {
        self.state.objects.lock().insert(name.to_string(), steps);
        self
    }

    /// Every open fails with a source error.
    pub fn failing_open(self, reason: &str) -> Self {
        *self.state.fail_open.lock() = Some(reason.to_string());
        self
    }

    /// `(container, object)` pairs in open order.
    pub fn opened(&self) -> Vec<(String, String)> {
        self.state.opened.lock().clone()
    }

    pub fn open_count(&self) -> usize {
        self.state.opened.lock().len()
    }
}

fn replay(steps: Vec<Step>) -> ByteStream {
    stream::iter(steps)
        .flat_map(|step| match step {
            Step::Chunk(bytes) => stream::once(future::ready(Ok::<_, Error>(bytes))).boxed(),
            Step::Fail(reason) => stream::once(future::ready(Err(Error::Source(reason)))).boxed(),
            Step::Stall => stream::pending::<Result<Bytes>>().boxed(),
        })
        .boxed()
}

#[async_trait]
impl StreamSource for ChunkedSource {
    async fn open(&self, blob: &BlobSettings, object: &ObjectName) -> Result<Option<ByteStream>> {
        self.state
            .opened
            .lock()
            .push((blob.container.clone(), object.to_string()));

        let fail = self.state.fail_open.lock().clone();
        if let Some(reason) = fail {
            return Err(Error::Source(reason));
        }

        let steps = self.state.objects.lock().get(object.as_str()).cloned();
        Ok(steps.map(replay))
    }
}
