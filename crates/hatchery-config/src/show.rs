//! Source-annotated display for `config show`.

use std::fmt::{self, Write as _};

use crate::merge::FieldSources;
use crate::types::Config;

/// Merged configuration plus where each value came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Validated result of the merge.
    pub config: Config,
    /// Layer that set each dotted field path.
    pub field_sources: FieldSources,
    /// Files that existed and were merged, lowest precedence first.
    pub loaded_files: Vec<String>,
}

/// Rendering for `config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML, each value followed by a `# [layer]` comment.
    Toml,
    /// Plain JSON with no annotations.
    Json,
}

impl ResolvedConfig {
    /// Result of `--config FILE`: one file, no per-field sources.
    #[must_use]
    pub fn from_single_file(config: Config, path: impl Into<String>) -> Self {
        Self {
            config,
            field_sources: FieldSources::new(),
            loaded_files: vec![path.into()],
        }
    }

    /// Serialize the config in `format`.
    ///
    /// # Errors
    ///
    /// Only when serialization itself fails.
    pub fn show(&self, format: ShowFormat) -> Result<String, fmt::Error> {
        match format {
            ShowFormat::Toml => self.show_toml(),
            ShowFormat::Json => serde_json::to_string_pretty(&self.config).map_err(|_| fmt::Error),
        }
    }

    fn show_toml(&self) -> Result<String, fmt::Error> {
        let toml_str = toml::to_string_pretty(&self.config).map_err(|_| fmt::Error)?;

        let mut output = String::new();
        output.push_str("# Resolved Hatchery configuration\n");
        output.push_str("# Each value is tagged with its layer: defaults, user, workspace or env\n");

        if !self.loaded_files.is_empty() {
            output.push_str("#\n# Merged files, lowest precedence first:\n");
            for (i, path) in self.loaded_files.iter().enumerate() {
                writeln!(output, "#   {}. {path}", i.saturating_add(1))?;
            }
        }
        output.push('\n');

        let mut section = String::new();
        for line in toml_str.lines() {
            let trimmed = line.trim();
            if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
                header.clone_into(&mut section);
            }
            match self.annotate_line(trimmed, &section) {
                Some(annotation) => writeln!(output, "{line}  # {annotation}")?,
                None => writeln!(output, "{line}")?,
            }
        }

        Ok(output)
    }

    fn annotate_line(&self, trimmed: &str, section: &str) -> Option<String> {
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('[') {
            return None;
        }
        let key = trimmed.split('=').next()?.trim();
        let field_path = if section.is_empty() {
            key.to_owned()
        } else {
            format!("{section}.{key}")
        };
        self.field_sources
            .get(&field_path)
            .map(|layer| format!("[{layer}]"))
    }

    /// The user and workspace file locations, with placeholders when a
    /// root is unknown.
    #[must_use]
    pub fn config_paths(home_dir: Option<&str>, workspace_root: Option<&str>) -> Vec<String> {
        let user = home_dir.map_or_else(
            || "~/.hatchery/config.toml".to_owned(),
            |home| format!("{home}/.hatchery/config.toml"),
        );
        let workspace = workspace_root.map_or_else(
            || "{workspace}/.hatchery/config.toml".to_owned(),
            |ws| format!("{ws}/.hatchery/config.toml"),
        );
        vec![user, workspace]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::ConfigLayer;

    fn resolved() -> ResolvedConfig {
        let mut field_sources = FieldSources::new();
        field_sources.insert("logging.level".to_owned(), ConfigLayer::Workspace);
        field_sources.insert("plugins.directory".to_owned(), ConfigLayer::Defaults);
        ResolvedConfig {
            config: Config::default(),
            field_sources,
            loaded_files: vec!["/w/.hatchery/config.toml".to_owned()],
        }
    }

    #[test]
    fn test_show_toml_annotates_sources() {
        let output = resolved().show(ShowFormat::Toml).unwrap();
        assert!(output.contains("Resolved Hatchery configuration"));
        assert!(output.contains("1. /w/.hatchery/config.toml"));
        let level = output.lines().find(|l| l.starts_with("level")).unwrap();
        assert!(level.ends_with("# [workspace]"));
        let dir = output.lines().find(|l| l.starts_with("directory")).unwrap();
        assert!(dir.ends_with("# [defaults]"));
    }

    #[test]
    fn test_show_json_default() {
        let output = resolved().show(ShowFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["logging"]["level"], "info");
    }

    #[test]
    fn test_config_paths() {
        let paths = ResolvedConfig::config_paths(Some("/home/user"), Some("/home/user/project"));
        assert_eq!(
            paths,
            vec![
                "/home/user/.hatchery/config.toml".to_owned(),
                "/home/user/project/.hatchery/config.toml".to_owned(),
            ]
        );
    }
}
