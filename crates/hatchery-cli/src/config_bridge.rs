//! Bridge from `hatchery_config::Config` to plugin and logging types.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hatchery_config::Config;
use hatchery_plugins::{Host, HostInfo, IgnoredExtensions, ManifestLoader, PluginManager};
use hatchery_telemetry::{FileRotation, LogConfig, LogFormat, LogTarget};
use tracing::warn;

/// Name the CLI reports to plugins.
pub(crate) const HOST_NAME: &str = "hatchery";

/// Convert config to [`LogConfig`].
///
/// Validation already restricts format, target and rotation; unknown values
/// fall back to compact output on stderr. A relative `logging.file_dir`
/// resolves against `cwd`, and log files are named after [`HOST_NAME`].
pub(crate) fn to_log_config(cfg: &Config, cwd: &Path) -> LogConfig {
    let logging = &cfg.logging;
    let format = LogFormat::from_str(&logging.format).unwrap_or(LogFormat::Compact);
    let mut log_config = LogConfig::new(&logging.level).with_format(format);

    let target = logging.target.trim().to_ascii_lowercase();
    match (target.as_str(), logging.file_dir.as_deref()) {
        ("stdout", _) => log_config = log_config.with_target(LogTarget::Stdout),
        ("file", Some(dir)) => {
            let rotation = FileRotation::from_str(&logging.rotation).unwrap_or_default();
            log_config = log_config
                .with_file_logging_rotation(cwd.join(dir), HOST_NAME, rotation)
                .with_max_files(logging.max_files);
        },
        _ => {},
    }

    for directive in &logging.directives {
        log_config = log_config.with_directive(directive);
    }
    log_config
}

/// Host rooted at the configured working directory, or `cwd`.
pub(crate) fn to_host(cfg: &Config, cwd: &Path) -> Arc<dyn Host> {
    let working_dir = cfg
        .plugins
        .working_dir
        .as_deref()
        .map_or_else(|| cwd.to_path_buf(), |dir| cwd.join(dir));
    Arc::new(HostInfo::new(HOST_NAME, working_dir))
}

/// Convert `plugins.ignored_extensions` to [`IgnoredExtensions`].
pub(crate) fn to_ignored(cfg: &Config) -> Result<IgnoredExtensions> {
    IgnoredExtensions::new(&cfg.plugins.ignored_extensions)
        .context("invalid plugins.ignored_extensions")
}

/// Manager for `cfg` with the built-in loaders registered.
pub(crate) fn build_manager(cfg: &Config, cwd: &Path) -> Result<PluginManager> {
    let manager = PluginManager::builder(to_host(cfg, cwd))
        .ignored_extensions(to_ignored(cfg)?)
        .build();
    if !manager.register_loader::<ManifestLoader>() {
        warn!("Manifest loader was not registered");
    }
    Ok(manager)
}
