//! The embedding application, as plugins see it.

use std::fmt;
use std::path::{Path, PathBuf};

/// The host application that owns the loader table and the plugins.
///
/// Every [`LoadedPlugin`](crate::LoadedPlugin) carries a reference to its
/// host. The working directory anchors per-plugin storage
/// (`<working_dir>/plugins/<name>`).
pub trait Host: Send + Sync {
    /// Human-readable host name, used in log fields.
    fn name(&self) -> &str;

    /// Base directory for plugin storage.
    fn working_dir(&self) -> &Path;
}

impl fmt::Debug for dyn Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("name", &self.name())
            .field("working_dir", &self.working_dir())
            .finish()
    }
}

/// Plain-data [`Host`] for applications that need nothing more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    name: String,
    working_dir: PathBuf,
}

impl HostInfo {
    /// Create a host description.
    #[must_use]
    pub fn new(name: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Host rooted at the process's current directory, falling back to `.`.
    #[must_use]
    pub fn current_dir(name: impl Into<String>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(name, cwd)
    }
}

impl Host for HostInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}
