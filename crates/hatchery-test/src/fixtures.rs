//! Test fixtures for hosts and plugin directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hatchery_plugins::{Host, HostInfo, PluginManager};
use tempfile::TempDir;

/// Create a test host rooted at `working_dir`.
#[must_use]
pub fn test_host(working_dir: impl Into<PathBuf>) -> Arc<dyn Host> {
    Arc::new(HostInfo::new("test-host", working_dir))
}

/// A temporary host working directory next to a plugin drop directory.
///
/// Layout:
///
/// ```text
/// <tmp>/work      host working directory (plugin storage lives here)
/// <tmp>/plugins   artifacts to scan
/// ```
///
/// Everything is removed when the fixture is dropped.
#[derive(Debug)]
pub struct PluginDirFixture {
    root: TempDir,
}

impl PluginDirFixture {
    /// Create both directories.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("work")).expect("create work dir");
        std::fs::create_dir_all(root.path().join("plugins")).expect("create plugins dir");
        Self { root }
    }

    /// The host working directory.
    #[must_use]
    pub fn working_dir(&self) -> PathBuf {
        self.root.path().join("work")
    }

    /// The directory artifacts are written to.
    #[must_use]
    pub fn plugins_dir(&self) -> PathBuf {
        self.root.path().join("plugins")
    }

    /// Write `contents` to `plugins/<file_name>` and return its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn add_file(&self, file_name: &str, contents: &str) -> PathBuf {
        let path = self.plugins_dir().join(file_name);
        std::fs::write(&path, contents).expect("write plugin file");
        path
    }

    /// Write a `<stem>.toml` plugin manifest.
    pub fn add_manifest(&self, stem: &str, body: &str) -> PathBuf {
        self.add_file(&format!("{stem}.toml"), body)
    }

    /// Create `plugins/<name>/` and return its path.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    pub fn add_subdir(&self, name: &str) -> PathBuf {
        let path = self.plugins_dir().join(name);
        std::fs::create_dir_all(&path).expect("create subdir");
        path
    }

    /// A host rooted at [`working_dir`](Self::working_dir).
    #[must_use]
    pub fn host(&self) -> Arc<dyn Host> {
        test_host(self.working_dir())
    }

    /// A manager for [`host`](Self::host) with default ignored extensions.
    #[must_use]
    pub fn manager(&self) -> PluginManager {
        PluginManager::new(self.host())
    }

    /// Root of the temporary tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.root.path()
    }
}

impl Default for PluginDirFixture {
    fn default() -> Self {
        Self::new()
    }
}
