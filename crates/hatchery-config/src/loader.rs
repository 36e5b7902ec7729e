//! Finding, reading and merging config layers.
//!
//! The embedded defaults form the base tree. The user file and then the
//! workspace file are merged over it as raw TOML, env fallbacks fill the
//! fields still at their defaults, and only then is the tree deserialized
//! and validated.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Larger files are rejected before parsing.
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Directory under home and workspace roots that holds `config.toml`.
pub const CONFIG_DIR_NAME: &str = ".hatchery";

/// Build a [`ResolvedConfig`] from every layer.
///
/// Without a `workspace_root` there is no workspace layer. A `home_override`
/// names the `.hatchery` directory directly, bypassing home lookup.
///
/// # Errors
///
/// [`ConfigError::NoHomeDir`] when no override is given and the home
/// directory is unknown; otherwise the first read, parse or validation
/// failure.
pub fn load(workspace_root: Option<&Path>, home_override: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    let user_path = match home_override {
        Some(dir) => dir.join("config.toml"),
        None => home_directory()?.join(CONFIG_DIR_NAME).join("config.toml"),
    };
    load_layers(Some(&user_path), workspace_root, &collect_env_vars())
}

/// [`load`] with the user file and environment passed in.
pub(crate) fn load_layers<S: BuildHasher>(
    user_path: Option<&Path>,
    workspace_root: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    let workspace_path = workspace_root.map(|root| root.join(CONFIG_DIR_NAME).join("config.toml"));
    let layers = [
        (user_path.map(Path::to_path_buf), ConfigLayer::User),
        (workspace_path, ConfigLayer::Workspace),
    ];
    for (path, layer) in layers {
        let Some(path) = path else { continue };
        let Some(overlay) = try_load_file(&path)? else {
            continue;
        };
        deep_merge_tracking(&mut merged, &overlay, "", &layer, &mut field_sources);
        info!(path = %path.display(), %layer, "merged config layer");
        loaded_files.push(path.display().to_string());
    }

    let applied = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars);
    if applied > 0 {
        debug!(applied, "env fallbacks filled unset fields");
    }

    let config: Config = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: "<merged config>".to_owned(),
            source: e,
        })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Parse and validate one file on its own. Missing fields take their
/// serde defaults.
///
/// # Errors
///
/// Fails when the file is missing, oversized, malformed or invalid.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let len = std::fs::metadata(path)
        .map_err(|e| read_error(path, e))?
        .len();
    check_size(path, len)?;

    let content = std::fs::read_to_string(path).map_err(|e| read_error(path, e))?;
    let config: Config = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    validate::validate(&config)?;
    Ok(config)
}

fn read_error(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::ReadError {
        path: path.display().to_string(),
        source,
    }
}

fn parse_error(path: &Path, source: toml::de::Error) -> ConfigError {
    ConfigError::ParseError {
        path: path.display().to_string(),
        source,
    }
}

fn check_size(path: &Path, len: u64) -> ConfigResult<()> {
    if len > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::invalid(
            &path.display().to_string(),
            format!("{len} bytes is over the {MAX_CONFIG_FILE_SIZE} byte limit"),
        ));
    }
    Ok(())
}

/// Raw TOML tree of an optional layer. `None` when the file is absent.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config layer here");
            return Ok(None);
        },
        Err(e) => return Err(read_error(path, e)),
    };

    check_size(path, u64::try_from(content.len()).unwrap_or(u64::MAX))?;
    toml::from_str(&content)
        .map(Some)
        .map_err(|e| parse_error(path, e))
}

fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    fn write_config(root: &Path, body: &str) -> PathBuf {
        let dir = root.join(CONFIG_DIR_NAME);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_without_files() {
        let tmp = tempfile::tempdir().unwrap();
        let resolved = load_layers(Some(&tmp.path().join("missing.toml")), Some(tmp.path()), &no_env()).unwrap();
        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.field_sources.get("plugins.directory"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_workspace_overrides_user_overrides_defaults() {
        let home = tempfile::tempdir().unwrap();
        let ws = tempfile::tempdir().unwrap();
        let user = write_config(
            home.path(),
            "[logging]\nlevel = \"debug\"\nformat = \"compact\"\n",
        );
        write_config(ws.path(), "[logging]\nlevel = \"warn\"\n");

        let resolved = load_layers(Some(&user), Some(ws.path()), &no_env()).unwrap();
        assert_eq!(resolved.config.logging.level, "warn");
        assert_eq!(resolved.config.logging.format, "compact");
        assert_eq!(resolved.config.plugins.ignored_extensions, vec!["jar".to_owned()]);
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(resolved.field_sources.get("logging.level"), Some(&ConfigLayer::Workspace));
        assert_eq!(resolved.field_sources.get("logging.format"), Some(&ConfigLayer::User));
    }

    #[test]
    fn test_env_fallback_only_fills_unset_fields() {
        let ws = tempfile::tempdir().unwrap();
        write_config(ws.path(), "[logging]\nlevel = \"warn\"\n");
        let env: HashMap<String, String> = [
            ("HATCHERY_LOG".to_owned(), "trace".to_owned()),
            ("HATCHERY_PLUGIN_DIR".to_owned(), "/opt/plugins".to_owned()),
        ]
        .into_iter()
        .collect();

        let resolved = load_layers(None, Some(ws.path()), &env).unwrap();
        assert_eq!(resolved.config.logging.level, "warn");
        assert_eq!(resolved.config.plugins.directory, PathBuf::from("/opt/plugins"));
    }

    #[test]
    fn test_invalid_layer_fails_validation() {
        let ws = tempfile::tempdir().unwrap();
        write_config(ws.path(), "[plugins]\nignored_extensions = [\"../x\"]\n");
        let err = load_layers(None, Some(ws.path()), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "plugins.ignored_extensions"));
    }

    #[test]
    fn test_malformed_layer_is_parse_error() {
        let ws = tempfile::tempdir().unwrap();
        write_config(ws.path(), "[plugins\n");
        let err = load_layers(None, Some(ws.path()), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_with_home_override() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join("config.toml"), "[logging]\nformat = \"json\"\n").unwrap();
        let resolved = load(None, Some(home.path())).unwrap();
        assert_eq!(resolved.config.logging.format, "json");
    }

    #[test]
    fn test_load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_load_file_single() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hatchery.toml");
        std::fs::write(&path, "[plugins]\ndirectory = \"ext\"\n").unwrap();
        let config = load_file(&path).unwrap();
        assert_eq!(config.plugins.directory, PathBuf::from("ext"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_try_load_file_missing() {
        let result = try_load_file(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&file_path, data).unwrap();

        let result = try_load_file(&file_path);
        assert!(
            matches!(result, Err(ConfigError::ValidationError { .. })),
            "oversized layer should be rejected, got {result:?}"
        );
    }
}
