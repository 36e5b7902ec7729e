//! Layer merging on raw TOML trees.
//!
//! Keys absent from an upper layer keep the lower layer's value, which a
//! merge of deserialized structs could not tell apart from a default.

use std::collections::HashMap;

/// Origin of a resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// `defaults.toml`, embedded in the binary.
    Defaults,
    /// `~/.hatchery/config.toml`.
    User,
    /// `{workspace}/.hatchery/config.toml`.
    Workspace,
    /// A `HATCHERY_*` variable.
    Environment,
}

impl ConfigLayer {
    /// True for the user and workspace files.
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::User | Self::Workspace)
    }
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::User => write!(f, "user"),
            Self::Workspace => write!(f, "workspace"),
            Self::Environment => write!(f, "env"),
        }
    }
}

/// Dotted field path to the layer that last set it.
pub type FieldSources = HashMap<String, ConfigLayer>;

fn child_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Merge `overlay` into `base` and attribute every leaf it touches to `layer`.
///
/// Tables are merged key by key. Any other overlay value, arrays included,
/// replaces what was there.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = child_path(prefix, key);
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, layer, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            record_leaves(overlay, prefix, layer, sources);
        },
    }
}

/// Attribute every leaf under `val` to `layer`.
pub fn record_leaves(val: &toml::Value, prefix: &str, layer: &ConfigLayer, sources: &mut FieldSources) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &child_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_deep_merge_scalars_and_arrays() {
        let mut base = parse(
            r#"
            [plugins]
            directory = "plugins"
            ignored_extensions = ["jar"]
            [logging]
            level = "info"
            "#,
        );
        let overlay = parse(
            r#"
            [plugins]
            ignored_extensions = ["jar", "md"]
            "#,
        );
        let mut sources = FieldSources::new();
        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::User, &mut sources);

        assert_eq!(base["plugins"]["directory"].as_str(), Some("plugins"));
        assert_eq!(base["plugins"]["ignored_extensions"].as_array().unwrap().len(), 2);
        assert_eq!(base["logging"]["level"].as_str(), Some("info"));
        assert_eq!(sources.get("plugins.ignored_extensions"), Some(&ConfigLayer::User));
        assert!(!sources.contains_key("plugins.directory"));
    }

    #[test]
    fn test_deep_merge_new_keys() {
        let mut base = parse("[plugins]\ndirectory = \"plugins\"");
        let overlay = parse("[plugins]\nworking_dir = \"/srv\"\n[logging]\nformat = \"json\"");
        let mut sources = FieldSources::new();
        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::Workspace, &mut sources);

        assert_eq!(base["plugins"]["working_dir"].as_str(), Some("/srv"));
        assert_eq!(base["logging"]["format"].as_str(), Some("json"));
        assert_eq!(sources.get("plugins.working_dir"), Some(&ConfigLayer::Workspace));
        assert_eq!(sources.get("logging.format"), Some(&ConfigLayer::Workspace));
    }

    #[test]
    fn test_later_layer_wins() {
        let mut base = parse("[logging]\nlevel = \"info\"");
        let mut sources = FieldSources::new();
        record_leaves(&base.clone(), "", &ConfigLayer::Defaults, &mut sources);
        deep_merge_tracking(&mut base, &parse("[logging]\nlevel = \"debug\""), "", &ConfigLayer::User, &mut sources);
        deep_merge_tracking(&mut base, &parse("[logging]\nlevel = \"warn\""), "", &ConfigLayer::Workspace, &mut sources);

        assert_eq!(base["logging"]["level"].as_str(), Some("warn"));
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::Workspace));
        assert!(ConfigLayer::Workspace.is_file());
        assert!(!ConfigLayer::Defaults.is_file());
    }
}
