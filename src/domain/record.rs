//! Records and batches flowing through the ingestion pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default number of records per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// One parsed order document.
///
/// Contents are never interpreted; the value is passed through to the store
/// exactly as decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A bounded group of records flushed to the sink together.
///
/// `seq` is the zero-based position of the batch within its invocation and
/// exists only for log context.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    seq: u64,
    records: Vec<Record>,
}

impl Batch {
    pub fn new(seq: u64, records: Vec<Record>) -> Self {
        Self { seq, records }
    }

    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
