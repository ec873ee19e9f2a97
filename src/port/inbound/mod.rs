//! Inbound (driving) ports consumed by inbound adapters.
//!
//! Inbound ports expose application capabilities to external drivers such as:
//!
//! - Command-line interface (CLI)
//! - HTTP webhook and admin endpoints
//!
//! # Modules
//!
//! - [`operator`]: Ingestion and admin use cases

pub mod operator;
