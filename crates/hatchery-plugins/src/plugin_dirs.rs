//! Per-plugin storage directory management.
//!
//! Each plugin gets a private directory at `<working_dir>/plugins/<name>/`
//! unless its loader assigns a different one.

use std::path::{Path, PathBuf};

/// Name of the directory under the host's working directory that holds
/// plugin storage.
pub const PLUGINS_DIR_NAME: &str = "plugins";

/// Return the default storage directory for a plugin.
///
/// Layout: `<working_dir>/plugins/<plugin_name>/`
///
/// Does **not** create the directory; call [`ensure_storage_dir`] for that.
#[must_use]
pub fn plugin_storage_dir(working_dir: &Path, plugin_name: &str) -> PathBuf {
    working_dir.join(PLUGINS_DIR_NAME).join(plugin_name)
}

/// Ensure a storage directory exists, creating parents as needed.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_storage_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}
