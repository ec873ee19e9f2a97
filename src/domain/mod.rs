//! Store- and transport-agnostic domain types.

mod ids;
mod outcome;
mod record;
mod report;

pub mod event;
pub mod settings;

pub use event::{BlobEvent, EventMatch};
pub use ids::{InvocationId, ObjectName};
pub use outcome::{
    DropResponse, Outcome, Phase, SkipReason, DROP_FAILED_BODY, DROP_OK_BODY,
};
pub use record::{Batch, Record, DEFAULT_BATCH_SIZE};
pub use report::IngestReport;
pub use settings::{BlobSettings, IngestConfig, Settings, SettingsLookup, StoreSettings};
