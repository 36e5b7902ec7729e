#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for Hatchery hosts.
//!
//! ```rust,no_run
//! use hatchery_config::Config;
//!
//! let resolved = Config::load(Some(std::path::Path::new("."))).unwrap();
//! println!("plugin dir: {}", resolved.config.plugins.directory.display());
//! ```
//!
//! Layers, later ones winning field by field:
//!
//! - `defaults.toml`, embedded at compile time
//! - `~/.hatchery/config.toml`
//! - `{workspace}/.hatchery/config.toml`
//!
//! `HATCHERY_*` variables only fill fields that neither file set. The crate
//! does not depend on `hatchery-plugins`; the host converts sections into
//! plugin and logging types itself.

pub mod env;
pub mod error;
pub mod loader;
pub mod merge;
pub mod show;
pub mod types;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use merge::{ConfigLayer, FieldSources};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

impl Config {
    /// Merge every layer for `workspace_root` and validate the result.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable or malformed layer, or on a merged value that
    /// does not validate.
    pub fn load(workspace_root: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, None)
    }

    /// Same as [`Config::load`], reading the user layer from `home_dir`
    /// instead of the real home directory.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_with_home(
        workspace_root: Option<&std::path::Path>,
        home_dir: &std::path::Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, Some(home_dir))
    }

    /// Read exactly one file over the embedded defaults, without user,
    /// workspace or env layers.
    ///
    /// # Errors
    ///
    /// Fails when the file is unreadable, malformed or invalid.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
