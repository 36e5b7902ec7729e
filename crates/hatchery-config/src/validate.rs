//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];
const LOG_TARGETS: &[&str] = &["stderr", "stdout", "file"];
const LOG_ROTATIONS: &[&str] = &["daily", "hourly", "minutely", "never"];

fn one_of(field: &str, value: &str, allowed: &[&str]) -> ConfigResult<()> {
    if allowed.contains(&value.trim().to_ascii_lowercase().as_str()) {
        return Ok(());
    }
    Err(ConfigError::invalid(
        field,
        format!("'{value}' is not one of: {}", allowed.join(", ")),
    ))
}

/// Validate a fully merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_plugins(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_plugins(config: &Config) -> ConfigResult<()> {
    let p = &config.plugins;

    if p.directory.as_os_str().is_empty() {
        return Err(ConfigError::invalid(
            "plugins.directory",
            "plugin directory must not be empty",
        ));
    }

    for ext in &p.ignored_extensions {
        if let Err(message) = check_extension(ext) {
            return Err(ConfigError::invalid("plugins.ignored_extensions", message));
        }
    }

    if let Some(dir) = &p.working_dir {
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid(
                "plugins.working_dir",
                "working directory must not be empty when set",
            ));
        }
    }

    Ok(())
}

/// Same shape the plugin framework accepts: optional leading dot, then
/// dot-separated segments of `[A-Za-z0-9_+-]`.
fn check_extension(raw: &str) -> Result<(), String> {
    let ext = raw.trim();
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    if ext.is_empty() {
        return Err("extension must not be empty".to_owned());
    }
    if ext.split('.').any(str::is_empty) {
        return Err(format!("extension '{raw}' has an empty segment"));
    }
    if !ext
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'))
    {
        return Err(format!(
            "extension '{raw}' must contain only alphanumeric characters and '._+-'"
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if l.level.trim().is_empty() {
        return Err(ConfigError::invalid("logging.level", "log level must not be empty"));
    }

    one_of("logging.format", &l.format, LOG_FORMATS)?;
    one_of("logging.target", &l.target, LOG_TARGETS)?;
    one_of("logging.rotation", &l.rotation, LOG_ROTATIONS)?;

    let wants_file = l.target.trim().eq_ignore_ascii_case("file");
    let has_dir = l.file_dir.as_ref().is_some_and(|d| !d.as_os_str().is_empty());
    if wants_file && !has_dir {
        return Err(ConfigError::invalid(
            "logging.file_dir",
            "a log directory is required when logging.target is \"file\"",
        ));
    }

    if l.directives.iter().any(|d| d.trim().is_empty()) {
        return Err(ConfigError::invalid(
            "logging.directives",
            "directives must not be empty strings",
        ));
    }

    Ok(())
}
