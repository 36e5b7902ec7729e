//! Telemetry error types.

use thiserror::Error;

/// Errors raised while building or installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A level, directive or format string was rejected.
    #[error("invalid logging configuration: {0}")]
    ConfigError(String),

    /// A global subscriber is already installed, or the appender failed.
    #[error("cannot initialize logging: {0}")]
    InitError(String),

    /// The log directory could not be created.
    #[error("log directory I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
