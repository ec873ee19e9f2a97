//! SQLite database modules.
//!
//! Connection management, the schema and Diesel model types for the
//! `documents` table.

pub mod connection;
pub mod model;
pub mod schema;
