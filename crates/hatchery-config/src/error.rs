//! Configuration errors.

use std::io;
use thiserror::Error;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("cannot read config file {path}: {source}")]
    ReadError {
        /// File that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A layer (or the merged tree) is not valid TOML for [`Config`](crate::Config).
    #[error("invalid config in {path}: {source}")]
    ParseError {
        /// File or pseudo-path (`<merged config>`) that failed.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A merged value is out of range.
    #[error("invalid value for {field}: {message}")]
    ValidationError {
        /// Dotted field path, such as `plugins.ignored_extensions`.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// No home directory to look for `~/.hatchery/config.toml` in.
    #[error("no home directory found for the user config layer")]
    NoHomeDir,
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
