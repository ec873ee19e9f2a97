use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// The input stream is not a well-formed JSON array of values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed JSON at byte {offset}: {reason}")]
pub struct ParseError {
    /// Absolute byte offset into the stream where the problem was detected.
    pub offset: u64,
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("no readable stream for {container}/{object}")]
    StreamUnavailable { container: String, object: String },

    #[error("stream source error: {0}")]
    Source(String),

    #[error("invocation exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short stable label for the error class, used as a log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration",
            Self::Parse(_) => "parse",
            Self::Connection(_) => "connection",
            Self::Database(_) => "database",
            Self::StreamUnavailable { .. } => "stream_unavailable",
            Self::Source(_) => "source",
            Self::Timeout(_) => "timeout",
            Self::Json(_) => "json",
            Self::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<object_store::Error> for Error {
    fn from(err: object_store::Error) -> Self {
        Error::Source(err.to_string())
    }
}
