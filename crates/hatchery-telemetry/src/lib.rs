//! Logging setup for Hatchery hosts.
//!
//! Builds a `tracing` subscriber from a [`LogConfig`]: an `EnvFilter` plus a
//! single `fmt` layer whose format and writer are picked at runtime.
//!
//! # Example
//!
//! ```rust,no_run
//! use hatchery_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), hatchery_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("hatchery_plugins=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("Host started");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, build_subscriber,
    setup_default_logging, setup_logging,
};
