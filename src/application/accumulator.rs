//! Groups records into fixed-size batches and flushes them to a sink.
//!
//! Decoding and flushing are decoupled by a bounded queue feeding a single
//! flush worker:
//!
//! ```text
//! accept() ──► [current batch] ──full──► mpsc(max_pending) ──► worker ──► sink
//! ```
//!
//! - `accept` returns immediately while the queue has room, so decoding keeps
//!   going while batch N is being inserted. When `max_pending` full batches
//!   are already waiting, `accept` waits for a slot (backpressure).
//! - The worker issues sink calls one at a time in fill order.
//! - A rejected batch is logged and counted; later batches still flush.
//! - Dropping an unfinished accumulator aborts the worker. Queued batches are
//!   abandoned.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::{Batch, IngestReport, Record};
use crate::error::{Error, Result};
use crate::port::BatchSink;

pub struct BatchAccumulator {
    batch_size: usize,
    current: Vec<Record>,
    next_seq: u64,
    records_accepted: u64,
    tx: Option<mpsc::Sender<Batch>>,
    worker: Option<JoinHandle<IngestReport>>,
}

impl BatchAccumulator {
    /// Start an accumulator and its flush worker.
    ///
    /// `batch_size` and `max_pending` are clamped to at least 1.
    pub fn new<S>(sink: Arc<S>, batch_size: usize, max_pending: usize) -> Self
    where
        S: BatchSink + ?Sized + 'static,
    {
        let batch_size = batch_size.max(1);
        let (tx, rx) = mpsc::channel(max_pending.max(1));
        let worker = tokio::spawn(flush_worker(sink, rx));
        Self {
            batch_size,
            current: Vec::with_capacity(batch_size),
            next_seq: 0,
            records_accepted: 0,
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// Append `record`; hand the batch to the worker once it is full.
    ///
    /// # Errors
    /// Returns an error only if the flush worker has stopped.
    pub async fn accept(&mut self, record: Record) -> Result<()> {
        self.current.push(record);
        self.records_accepted += 1;
        if self.current.len() >= self.batch_size {
            self.dispatch().await?;
        }
        Ok(())
    }

    /// Records currently waiting in the in-progress batch.
    #[must_use]
    pub fn pending_records(&self) -> usize {
        self.current.len()
    }

    /// Flush the trailing batch (if non-empty) and wait for every
    /// outstanding flush to complete.
    ///
    /// # Errors
    /// Returns an error if the flush worker panicked.
    pub async fn finish(mut self) -> Result<IngestReport> {
        if !self.current.is_empty() {
            self.dispatch().await?;
        }
        self.drain().await
    }

    /// Stop without flushing the in-progress batch, waiting only for
    /// batches already handed to the worker.
    ///
    /// Used when the input stream fails: dispatched batches stay committed,
    /// the partial batch is discarded.
    ///
    /// # Errors
    /// Returns an error if the flush worker panicked.
    pub async fn abandon(mut self) -> Result<IngestReport> {
        let discarded = std::mem::take(&mut self.current);
        if !discarded.is_empty() {
            warn!(records = discarded.len(), "Discarding unflushed partial batch");
        }
        self.drain().await
    }

    async fn dispatch(&mut self) -> Result<()> {
        let records = std::mem::replace(&mut self.current, Vec::with_capacity(self.batch_size));
        let batch = Batch::new(self.next_seq, records);
        self.next_seq += 1;

        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| Error::Database("flush queue already closed".into()))?;
        debug!(batch = batch.seq(), records = batch.len(), "Batch queued");
        tx.send(batch)
            .await
            .map_err(|_| Error::Database("flush worker stopped".into()))
    }

    async fn drain(&mut self) -> Result<IngestReport> {
        // closing the queue lets the worker finish once it is empty
        drop(self.tx.take());
        let Some(worker) = self.worker.take() else {
            return Err(Error::Database("flush worker already joined".into()));
        };
        let mut report = worker
            .await
            .map_err(|e| Error::Database(format!("flush worker failed: {e}")))?;
        report.records_parsed = self.records_accepted;
        Ok(report)
    }
}

impl Drop for BatchAccumulator {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

async fn flush_worker<S>(sink: Arc<S>, mut rx: mpsc::Receiver<Batch>) -> IngestReport
where
    S: BatchSink + ?Sized,
{
    let mut report = IngestReport::default();

    while let Some(batch) = rx.recv().await {
        report.batches_dispatched += 1;
        let size = batch.len();
        let started = Instant::now();

        match sink.insert_batch(batch.records()).await {
            Ok(()) => {
                report.record_success(size);
                info!(
                    batch = batch.seq(),
                    records = size,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Batch inserted"
                );
            }
            Err(e) => {
                report.record_failure(size);
                error!(
                    batch = batch.seq(),
                    records = size,
                    error = %e,
                    "Batch insert failed, records dropped"
                );
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::store::RecordingStore;
    use crate::testkit::orders;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    async fn run(store: &RecordingStore, count: usize, batch_size: usize) -> IngestReport {
        let mut acc = BatchAccumulator::new(store.sink(), batch_size, 2);
        for value in orders(count) {
            acc.accept(Record::new(value)).await.unwrap();
        }
        acc.finish().await.unwrap()
    }

    // -------------------------------------------------------------------------
    // Batch sizing
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn splits_into_ceil_n_over_size_batches_in_order() {
        let store = RecordingStore::new();
        let report = run(&store, 23, 5).await;

        assert_eq!(store.attempt_sizes(), vec![5, 5, 5, 5, 3]);
        assert_eq!(store.written_records(), orders(23));
        assert_eq!(report.records_parsed, 23);
        assert_eq!(report.batches_dispatched, 5);
        assert_eq!(report.records_written, 23);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn zero_records_never_call_the_sink() {
        let store = RecordingStore::new();
        let report = run(&store, 0, 100).await;
        assert_eq!(store.insert_calls(), 0);
        assert_eq!(report, IngestReport::default());
    }

    #[tokio::test]
    async fn exact_multiple_has_no_trailing_flush() {
        let store = RecordingStore::new();
        run(&store, 100, 100).await;
        assert_eq!(store.attempt_sizes(), vec![100]);
    }

    #[tokio::test]
    async fn one_over_batch_size_flushes_a_single_trailing_record() {
        let store = RecordingStore::new();
        run(&store, 101, 100).await;
        assert_eq!(store.attempt_sizes(), vec![100, 1]);
    }

    #[tokio::test]
    async fn zero_batch_size_is_clamped_to_one() {
        let store = RecordingStore::new();
        run(&store, 3, 0).await;
        assert_eq!(store.attempt_sizes(), vec![1, 1, 1]);
    }

    // -------------------------------------------------------------------------
    // Failure isolation
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn failed_batch_does_not_stop_later_batches() {
        let store = RecordingStore::new().failing_call(1);
        let report = run(&store, 30, 10).await;

        assert_eq!(store.insert_calls(), 3);
        assert_eq!(store.written().len(), 2);
        let mut expected = orders(30);
        expected.drain(10..20);
        assert_eq!(store.written_records(), expected);
        assert_eq!(report.batches_written, 2);
        assert_eq!(report.batches_failed, 1);
        assert_eq!(report.records_failed, 10);
    }

    #[tokio::test]
    async fn abandon_discards_partial_batch_but_keeps_dispatched_ones() {
        let store = RecordingStore::new();
        let mut acc = BatchAccumulator::new(store.sink(), 4, 2);
        for value in orders(10) {
            acc.accept(Record::new(value)).await.unwrap();
        }
        assert_eq!(acc.pending_records(), 2);

        let report = acc.abandon().await.unwrap();
        assert_eq!(store.attempt_sizes(), vec![4, 4]);
        assert_eq!(report.records_written, 8);
        assert_eq!(report.records_parsed, 10);
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn accept_keeps_going_while_a_flush_is_in_progress() {
        let gate = Arc::new(Semaphore::new(0));
        let store = RecordingStore::new().with_gate(gate.clone());
        let mut acc = BatchAccumulator::new(store.sink(), 2, 2);

        // batch 0 is held by the sink, batches 1 and 2 fill the queue
        let accepted = tokio::time::timeout(Duration::from_secs(2), async {
            for value in orders(6) {
                acc.accept(Record::new(value)).await.unwrap();
            }
        })
        .await;
        assert!(accepted.is_ok(), "accept blocked on an in-progress flush");
        assert_eq!(store.written().len(), 0);

        gate.add_permits(3);
        let report = acc.finish().await.unwrap();
        assert_eq!(report.batches_written, 3);
        assert_eq!(store.written_records(), orders(6));
    }

    #[tokio::test]
    async fn accept_waits_when_the_queue_is_full() {
        let gate = Arc::new(Semaphore::new(0));
        let store = RecordingStore::new().with_gate(gate.clone());
        let mut acc = BatchAccumulator::new(store.sink(), 1, 1);

        let filled = tokio::time::timeout(Duration::from_millis(300), async {
            for value in orders(5) {
                acc.accept(Record::new(value)).await.unwrap();
            }
        })
        .await;
        assert!(filled.is_err(), "accept should apply backpressure");

        gate.add_permits(10);
        drop(acc);
    }

    #[tokio::test]
    async fn finish_waits_for_every_outstanding_flush() {
        let store = RecordingStore::new().with_insert_delay(Duration::from_millis(20));
        let report = run(&store, 9, 2).await;
        // all five inserts completed before finish returned
        assert_eq!(store.written().len(), 5);
        assert_eq!(report.batches_written, 5);
    }

    #[tokio::test]
    async fn dropping_an_unfinished_accumulator_abandons_queued_batches() {
        let gate = Arc::new(Semaphore::new(0));
        let store = RecordingStore::new().with_gate(gate.clone());
        let mut acc = BatchAccumulator::new(store.sink(), 1, 4);
        for value in orders(3) {
            acc.accept(Record::new(value)).await.unwrap();
        }
        drop(acc);

        gate.add_permits(10);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.written().len() <= 1);
    }
}
