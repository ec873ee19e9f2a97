//! In-memory [`DocumentStore`] that records every interaction.
//!
//! Clones share state, so a test can hand one clone to the code under test
//! and keep another for assertions.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::domain::{Record, StoreSettings};
use crate::error::{Error, Result};
use crate::port::{BatchSink, DocumentStore, StoreSession};

#[derive(Default)]
struct Recorded {
    connects: AtomicUsize,
    closes: AtomicUsize,
    drops: AtomicUsize,
    insert_calls: AtomicUsize,
    /// Sizes of every insert attempt, in call order.
    attempts: Mutex<Vec<usize>>,
    /// Contents of every successful insert, in call order.
    written: Mutex<Vec<Vec<Value>>>,
    fail_calls: Mutex<HashSet<usize>>,
    fail_connect: AtomicBool,
    fail_drop: AtomicBool,
    insert_delay: Mutex<Option<Duration>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

/// Recording store double.
#[derive(Clone, Default)]
pub struct RecordingStore {
    state: Arc<Recorded>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the insert call with zero-based index `call`.
    pub fn failing_call(self, call: usize) -> Self {
        self.state.fail_calls.lock().insert(call);
        self
    }

    pub fn failing_connect(self) -> Self {
        self.state.fail_connect.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_drop(self) -> Self {
        self.state.fail_drop.store(true, Ordering::SeqCst);
        self
    }

    /// Sleep this long inside every insert.
    pub fn with_insert_delay(self, delay: Duration) -> Self {
        *self.state.insert_delay.lock() = Some(delay);
        self
    }

    /// Every insert consumes one permit from `gate` before completing.
    pub fn with_gate(self, gate: Arc<Semaphore>) -> Self {
        *self.state.gate.lock() = Some(gate);
        self
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> usize {
        self.state.drops.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.state.insert_calls.load(Ordering::SeqCst)
    }

    /// Sizes of every insert attempt, successful or not.
    pub fn attempt_sizes(&self) -> Vec<usize> {
        self.state.attempts.lock().clone()
    }

    /// Successfully written batches.
    pub fn written(&self) -> Vec<Vec<Value>> {
        self.state.written.lock().clone()
    }

    /// Successfully written records, flattened in call order.
    pub fn written_records(&self) -> Vec<Value> {
        self.written().into_iter().flatten().collect()
    }

    /// True when nothing at all touched the store.
    pub fn untouched(&self) -> bool {
        self.connects() == 0
            && self.insert_calls() == 0
            && self.drops() == 0
            && self.closes() == 0
    }

    /// A session used directly as a sink, without a connect.
    pub fn sink(&self) -> Arc<dyn StoreSession> {
        Arc::new(RecordingSession {
            state: self.state.clone(),
        })
    }
}

impl DocumentStore for RecordingStore {
    fn session(&self, _settings: &StoreSettings) -> Arc<dyn StoreSession> {
        self.sink()
    }
}

struct RecordingSession {
    state: Arc<Recorded>,
}

#[async_trait]
impl BatchSink for RecordingSession {
    async fn insert_batch(&self, records: &[Record]) -> Result<()> {
        let call = self.state.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.state.attempts.lock().push(records.len());

        let gate = self.state.gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        let delay = *self.state.insert_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.state.fail_calls.lock().contains(&call) {
            return Err(Error::Database(format!("insert {call} rejected")));
        }
        let values = records.iter().map(|r| r.as_value().clone()).collect();
        self.state.written.lock().push(values);
        Ok(())
    }
}

#[async_trait]
impl StoreSession for RecordingSession {
    async fn connect(&self) -> Result<()> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(Error::Connection("store unreachable".into()));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn drop_collection(&self) -> Result<()> {
        if self.state.fail_drop.load(Ordering::SeqCst) {
            return Err(Error::Database("drop rejected".into()));
        }
        self.state.drops.fetch_add(1, Ordering::SeqCst);
        self.state.written.lock().clear();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
