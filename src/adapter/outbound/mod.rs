//! Outbound adapters (driven side).

pub mod blob;
pub mod sqlite;
