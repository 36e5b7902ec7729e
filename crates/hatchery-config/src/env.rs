//! Environment variable fallbacks.
//!
//! Env vars fill in fields that no config file set. They never override a
//! value from `~/.hatchery/config.toml` or the workspace file.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "HATCHERY_PLUGIN_DIR",
        field_path: "plugins.directory",
    },
    EnvMapping {
        var_name: "HATCHERY_WORKING_DIR",
        field_path: "plugins.working_dir",
    },
    EnvMapping {
        var_name: "HATCHERY_LOG",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "HATCHERY_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Names of every environment variable consulted during loading.
#[must_use]
pub fn supported_vars() -> Vec<&'static str> {
    ENV_MAPPINGS.iter().map(|m| m.var_name).collect()
}

/// Apply env var fallbacks to fields that no config file set.
///
/// Blank values are skipped. Returns how many fields were filled.
pub fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut filled: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources.get(mapping.field_path).is_some_and(ConfigLayer::is_file) {
            continue;
        }
        let Some(val) = env_vars.get(mapping.var_name) else {
            continue;
        };
        if val.trim().is_empty() {
            continue;
        }

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "env var fills unset field"
        );
        set_string_field(merged, mapping.field_path, val.trim());
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        filled = filled.saturating_add(1);
    }

    filled
}

/// Set `section.key` in the tree, creating the section table if needed.
fn set_string_field(root: &mut toml::Value, path: &str, val: &str) {
    let Some((section, key)) = path.split_once('.') else {
        return;
    };
    let Some(root) = root.as_table_mut() else {
        return;
    };
    let section = root
        .entry(section.to_owned())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    if let Some(table) = section.as_table_mut() {
        table.insert(key.to_owned(), toml::Value::String(val.to_owned()));
    }
}

/// Snapshot of the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_env_fills_defaulted_and_missing_fields() {
        let mut merged: toml::Value = toml::from_str("[plugins]\ndirectory = \"plugins\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("plugins.directory".to_owned(), ConfigLayer::Defaults);

        let env = make_env(&[
            ("HATCHERY_PLUGIN_DIR", "/opt/plugins"),
            ("HATCHERY_LOG", "debug"),
        ]);
        let count = apply_env_fallbacks(&mut merged, &mut sources, &env);

        assert_eq!(count, 2);
        assert_eq!(merged["plugins"]["directory"].as_str(), Some("/opt/plugins"));
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::Environment));
    }

    #[test]
    fn test_env_never_overrides_files() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".to_owned(), ConfigLayer::User);

        let env = make_env(&[("HATCHERY_LOG", "trace")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[("HATCHERY_LOG_FORMAT", "  ")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert!(sources.is_empty());
    }

    #[test]
    fn test_supported_vars() {
        let vars = supported_vars();
        assert!(vars.contains(&"HATCHERY_PLUGIN_DIR"));
        assert!(vars.contains(&"HATCHERY_LOG"));
    }
}
