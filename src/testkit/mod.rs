//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`source`] - [`ChunkedSource`](source::ChunkedSource), a scripted
//!   [`StreamSource`](crate::port::StreamSource).
//! - [`store`] - [`RecordingStore`](store::RecordingStore), an in-memory
//!   [`DocumentStore`](crate::port::DocumentStore) that counts connects,
//!   closes and inserts.
//! - [`config`] - Canonical test settings and lookups.

pub mod config;
pub mod source;
pub mod store;

use serde_json::{json, Value};

/// `count` distinct order documents.
pub fn orders(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"orderId": i, "customer": format!("c-{}", i % 7), "total": i * 3}))
        .collect()
}

/// Serialize `values` as one JSON array.
pub fn array_body(values: &[Value]) -> Vec<u8> {
    serde_json::to_vec(values).expect("values serialize")
}
