//! Error types for exectime

use thiserror::Error;

/// Result type alias for exectime operations
pub type ExecTimeResult<T> = Result<T, ExecTimeError>;

/// Errors raised while emitting a query log.
///
/// Registration itself never produces one of these; failures of the host's
/// hook registration are returned as the host's own error type.
#[derive(Debug, Error)]
pub enum ExecTimeError {
    /// The log sink rejected or failed the call
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Neither a direct collection nor a model-bound collection was available
    #[error("No collection resolvable for operation '{0}'")]
    MissingCollection(String),

    /// Query metadata could not be serialized for logging
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other errors (custom formatters, host hooks)
    #[error("{0}")]
    Other(String),
}

impl ExecTimeError {
    /// Create a missing-collection error for an operation
    pub fn missing_collection(op: impl Into<String>) -> Self {
        Self::MissingCollection(op.into())
    }

    /// Create a free-form error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Check if this error came from the log sink
    pub fn is_sink(&self) -> bool {
        matches!(self, Self::Sink(_))
    }
}

/// Errors raised by a [`LogSink`](crate::sink::LogSink).
#[derive(Debug, Error)]
pub enum SinkError {
    /// The configured level name is not a method of the sink
    #[error("Unknown logger level: {0}")]
    UnknownLevel(String),
}

impl SinkError {
    /// Create an unknown-level error
    pub fn unknown_level(level: impl Into<String>) -> Self {
        Self::UnknownLevel(level.into())
    }

    /// Check if this is an unknown level error
    pub fn is_unknown_level(&self) -> bool {
        matches!(self, Self::UnknownLevel(_))
    }
}
