//! Orderload - batched ingestion of JSON order files.
//!
//! When a blob lands in the configured container, its body (one JSON array
//! of order documents) is streamed, decoded incrementally, grouped into
//! fixed-size batches and bulk-inserted into a document collection. The
//! whole file is never held in memory.
//!
//! # Architecture
//!
//! Hexagonal:
//!
//! - [`domain`] - Records, batches, storage events and ingestion reports
//! - [`port`] - `StreamSource` and `DocumentStore` traits
//! - [`application`] - Decoder, batch accumulator, per-event orchestrator
//!   and the admin drop
//! - [`adapter`] - `object_store` blob source, SQLite document store, CLI
//!   and HTTP surfaces
//! - [`infrastructure`] - Configuration, logging and runtime wiring
//!
//! # Example
//!
//! ```no_run
//! use orderload::domain::BlobEvent;
//! use orderload::infrastructure::bootstrap::Services;
//! use orderload::infrastructure::config::settings::Config;
//! use orderload::port::OrderOperator;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_default("orderload.toml")?;
//! let services = Services::from_config(&config);
//! let outcome = services
//!     .ingest(&BlobEvent::blob_created("orders", "2024/06/01.json"))
//!     .await;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
