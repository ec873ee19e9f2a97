//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the two external dependencies of an
//! ingestion: the object storage holding order files and the document store
//! receiving the records.

pub mod source;
pub mod store;
