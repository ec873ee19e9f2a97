//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (object storage, document databases).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  decoder, accumulator,  ├──────────────┐
//!     │              │  orchestrator           │              │
//!     │              └─────────────────────────┘              │
//!     ▼                                                       ▼
//! ┌──────────────┐                                     ┌─────────────┐
//! │ StreamSource │                                     │DocumentStore│
//! │   Adapter    │                                     │   Adapter   │
//! └──────────────┘                                     └─────────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`OrderOperator`] - Ingestion and admin use cases for inbound adapters
//! - [`StreamSource`] - Object bytes for a created blob
//! - [`DocumentStore`], [`StoreSession`], [`BatchSink`] - Destination collection

pub mod inbound;
pub mod outbound;

pub use inbound::operator::OrderOperator;

pub use outbound::source::{ByteStream, StreamSource};
pub use outbound::store::{BatchSink, DocumentStore, StoreSession};
