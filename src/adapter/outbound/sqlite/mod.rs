//! SQLite persistence adapter.
//!
//! Provides the [`DocumentStore`](crate::port::DocumentStore) used in
//! production, backed by a Diesel-managed `documents` table.

pub mod database;
pub mod store;

pub use store::{SqliteDocumentStore, SqliteSession};
