//! Per-invocation ingestion counters.

use serde::Serialize;

/// Summary of what one pipeline run wrote to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records handed to the accumulator.
    pub records_parsed: u64,
    /// Batches dispatched to the sink (successful or not).
    pub batches_dispatched: u64,
    /// Batches the sink acknowledged.
    pub batches_written: u64,
    pub records_written: u64,
    /// Batches the sink rejected. Their records are not retried.
    pub batches_failed: u64,
    pub records_failed: u64,
}

impl IngestReport {
    pub(crate) fn record_success(&mut self, records: usize) {
        self.batches_written += 1;
        self.records_written += records as u64;
    }

    pub(crate) fn record_failure(&mut self, records: usize) {
        self.batches_failed += 1;
        self.records_failed += records as u64;
    }

    /// True when every dispatched batch was written.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.batches_failed == 0
    }
}
