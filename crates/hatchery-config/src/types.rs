//! Configuration struct definitions.
//!
//! Every field has a serde default, so a partial file deserializes cleanly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plugin discovery settings.
    pub plugins: PluginsSection,
    /// Log output settings.
    pub logging: LoggingSection,
}

/// `[plugins]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsSection {
    /// Directory scanned for plugin artifacts. Relative paths resolve against
    /// the host working directory.
    pub directory: PathBuf,
    /// Extensions whose unclaimed artifacts are skipped without a warning.
    pub ignored_extensions: Vec<String>,
    /// Host working directory; per-plugin storage lives under
    /// `<working_dir>/plugins/<name>`. Defaults to the process directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl Default for PluginsSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("plugins"),
            ignored_extensions: vec!["jar".to_owned()],
            working_dir: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level filter (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Output format (`pretty`, `compact`, `json`, `full`).
    pub format: String,
    /// Destination: `stderr`, `stdout` or `file`.
    pub target: String,
    /// Directory for rolling log files, required when `target = "file"`.
    /// Relative paths resolve against the process directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_dir: Option<PathBuf>,
    /// File rotation period (`daily`, `hourly`, `minutely`, `never`).
    pub rotation: String,
    /// Rotated files to keep. `0` keeps them all.
    pub max_files: usize,
    /// Extra per-target directives, e.g. `hatchery_plugins=debug`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            target: "stderr".to_owned(),
            file_dir: None,
            rotation: "daily".to_owned(),
            max_files: 0,
            directives: Vec::new(),
        }
    }
}

impl PluginsSection {
    /// Resolve [`directory`](Self::directory) against `base` when relative.
    #[must_use]
    pub fn resolved_directory(&self, base: &std::path::Path) -> PathBuf {
        if self.directory.is_absolute() {
            self.directory.clone()
        } else {
            base.join(&self.directory)
        }
    }
}
