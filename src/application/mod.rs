//! Application services (use cases).
//!
//! The ingestion pipeline is `decoder` → `accumulator`, driven per event by
//! `orchestrator`. `admin` holds the collection drop.

pub mod accumulator;
pub mod admin;
pub mod decoder;
pub mod orchestrator;
