//! Plugin directory enumeration.
//!
//! Only the immediate children of the plugin directory are considered.
//! Subdirectories are left alone; a loader that wants a directory layout can
//! claim a manifest file and read its siblings itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{PluginError, PluginResult};
use crate::plugin::LoadedPlugin;

/// List the regular files directly inside `root`, sorted by path.
///
/// Symlinks are followed. Entries that cannot be inspected are skipped with
/// a warning.
///
/// # Errors
///
/// Returns [`PluginError::ScanFailed`] if `root` itself cannot be read.
pub fn scan_dir(root: &Path) -> PluginResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root).map_err(|source| PluginError::ScanFailed {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %root.display(), error = %e, "Failed to read directory entry");
                continue;
            },
        };
        let path = entry.path();
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => debug!(path = %path.display(), "Skipping non-file entry"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to stat directory entry"),
        }
    }
    files.sort();
    Ok(files)
}

/// A file that a loader claimed but could not load.
#[derive(Debug)]
pub struct ScanFailure {
    /// The artifact.
    pub path: PathBuf,
    /// What the loader reported.
    pub error: PluginError,
}

/// Outcome of loading every artifact in a directory.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Plugins that loaded, in path order.
    pub loaded: Vec<Arc<LoadedPlugin>>,
    /// Files no loader claimed.
    pub skipped: Vec<PathBuf>,
    /// Files whose loader failed.
    pub failed: Vec<ScanFailure>,
}

impl ScanReport {
    /// Names of the loaded plugins, in path order.
    #[must_use]
    pub fn loaded_names(&self) -> Vec<&str> {
        self.loaded.iter().map(|p| p.name()).collect()
    }

    /// Whether every claimed artifact loaded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
