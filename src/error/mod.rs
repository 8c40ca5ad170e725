//! Error types for testdecor.

pub mod kind;

pub use kind::{Classify, FailureKind};

use std::time::Duration;

use thiserror::Error;

/// Raised by the timeout controller when an operation misses its deadline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} timed out after {}s", .deadline.as_secs_f64())]
pub struct TimedOut {
    pub operation: String,
    pub deadline: Duration,
}

impl Classify for TimedOut {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::Timeout
    }
}

/// Raised when a spawned operation is torn down by its runtime before finishing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} was cancelled before it completed")]
pub struct TaskCancelled {
    pub operation: String,
}

impl Classify for TaskCancelled {
    fn failure_kind(&self) -> FailureKind {
        FailureKind::Other
    }
}

/// Primary error type for testdecor operations.
#[derive(Error, Debug)]
pub enum DecorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Timeout(#[from] TimedOut),

    #[error(transparent)]
    Cancelled(#[from] TaskCancelled),

    #[error("{operation} panicked: {message}")]
    Panicked { operation: String, message: String },

    #[error("{kind} failure: {message}")]
    Failed { kind: FailureKind, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl DecorError {
    /// Create an operation failure of the given kind.
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::failed(FailureKind::Assertion, message)
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::failed(FailureKind::InvalidValue, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::failed(FailureKind::Connection, message)
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

impl Classify for DecorError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Configuration(_) | Self::ConfigParse(_) => FailureKind::Configuration,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Cancelled(err) => err.failure_kind(),
            Self::Panicked { .. } => FailureKind::Panic,
            Self::Failed { kind, .. } => *kind,
            Self::Io(err) => err.failure_kind(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DecorError>;
