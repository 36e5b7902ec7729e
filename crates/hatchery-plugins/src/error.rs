//! Plugin error types.

use std::path::PathBuf;

/// Errors from loader registration and plugin operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A loader factory failed to construct its loader.
    #[error("failed to instantiate loader {loader}: {message}")]
    Instantiation {
        /// Type name of the loader that could not be built.
        loader: &'static str,
        /// Failure reason.
        message: String,
    },

    /// A loader failed to turn an artifact into a plugin.
    #[error("failed to load plugin from {path}: {message}")]
    Load {
        /// Path of the artifact that failed to load.
        path: PathBuf,
        /// Failure reason.
        message: String,
    },

    /// The string is not a usable file extension.
    #[error("invalid extension: {0}")]
    InvalidExtension(String),

    /// A plugin with this name is already loaded by the loader.
    #[error("plugin already loaded: {0}")]
    AlreadyLoaded(String),

    /// The plugin directory could not be enumerated.
    #[error("failed to scan plugin directory {path}: {source}")]
    ScanFailed {
        /// Directory that was being scanned.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PluginError {
    /// Build a [`PluginError::Load`] for `path` from any displayable cause.
    pub fn load(path: impl Into<PathBuf>, cause: impl std::fmt::Display) -> Self {
        Self::Load {
            path: path.into(),
            message: cause.to_string(),
        }
    }

    /// Build a [`PluginError::Instantiation`] for loader type `L`.
    pub fn instantiation<L: ?Sized>(cause: impl std::fmt::Display) -> Self {
        Self::Instantiation {
            loader: std::any::type_name::<L>(),
            message: cause.to_string(),
        }
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
