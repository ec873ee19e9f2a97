//! Results reported by the ingestion and admin operations.

use std::fmt;

use crate::domain::IngestReport;
use crate::error::Error;

pub const DROP_OK_BODY: &str = "Orders Deleted";
pub const DROP_FAILED_BODY: &str = "Failed to delete orders";

/// Pipeline phase of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Fetching,
    Streaming,
    Flushing,
    Closing,
    Done,
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Fetching => "fetching",
            Self::Streaming => "streaming",
            Self::Flushing => "flushing",
            Self::Closing => "closing",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Why an event was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    WrongEventType,
    WrongContainer,
    EmptyObjectName,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::WrongEventType => "event type is not blob-created",
            Self::WrongContainer => "event targets another container",
            Self::EmptyObjectName => "event names no object",
        };
        f.write_str(reason)
    }
}

/// Terminal result of one invocation.
#[derive(Debug)]
pub enum Outcome {
    /// The event did not target the configured container.
    Skipped(SkipReason),
    Completed(IngestReport),
    /// A fatal error ended the invocation during `phase`.
    Aborted { phase: Phase, error: Error },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Completed(report) => write!(
                f,
                "completed: {} records parsed, {} written in {} batches, {} failed",
                report.records_parsed,
                report.records_written,
                report.batches_written,
                report.records_failed
            ),
            Self::Aborted { phase, error } => write!(f, "aborted while {phase}: {error}"),
        }
    }
}

impl Outcome {
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    #[must_use]
    pub const fn report(&self) -> Option<&IngestReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Transport-neutral response of the drop operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropResponse {
    pub status: u16,
    pub body: String,
}

impl DropResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: 200,
            body: DROP_OK_BODY.to_string(),
        }
    }

    pub fn failed(body: impl Into<String>) -> Self {
        Self {
            status: 500,
            body: body.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == 200
    }
}
