//! File extensions and the path patterns derived from them.
//!
//! An [`Extension`] is the dispatch key of the loader table. Each bound
//! extension owns exactly one [`PathPattern`], the compiled glob
//! `**/*.<extension>` that decides whether a path belongs to it.

use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};

use crate::error::{PluginError, PluginResult};

/// Normalized file extension: lowercase, no leading dot.
///
/// Extensions like `"jar"`, `"toml"` or `"tar.gz"` are accepted. Input is
/// normalized on construction, so `".JAR"` becomes `"jar"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Extension(String);

impl<'de> Deserialize<'de> for Extension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl Extension {
    /// Normalize and validate an extension.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidExtension`] if the normalized value is
    /// empty or contains characters outside `[a-z0-9._+-]`.
    pub fn new(raw: impl AsRef<str>) -> PluginResult<Self> {
        let raw = raw.as_ref().trim();
        let normalized = raw.strip_prefix('.').unwrap_or(raw).to_ascii_lowercase();
        Self::validate(&normalized)?;
        Ok(Self(normalized))
    }

    /// The extension of a path's final component, if it has a valid one.
    ///
    /// Only the text after the last dot is considered, so `archive.tar.gz`
    /// yields `gz`.
    #[must_use]
    pub fn of_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::new(ext).ok()
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the final component of `path` ends in `.<self>`.
    ///
    /// Comparison is ASCII case-insensitive, matching [`PathPattern`].
    #[must_use]
    pub fn is_suffix_of(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let file_name = file_name.to_ascii_lowercase();
        file_name
            .strip_suffix(self.0.as_str())
            .is_some_and(|stem| stem.len() > 1 && stem.ends_with('.'))
    }

    fn validate(ext: &str) -> PluginResult<()> {
        if ext.is_empty() {
            return Err(PluginError::InvalidExtension(
                "extension must not be empty".into(),
            ));
        }
        if !ext
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '+' | '-'))
        {
            return Err(PluginError::InvalidExtension(format!(
                "extension must contain only alphanumeric characters and '._+-', got: {ext}"
            )));
        }
        if ext.starts_with('.') || ext.ends_with('.') || ext.contains("..") {
            return Err(PluginError::InvalidExtension(format!(
                "extension must not have empty segments, got: {ext}"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Extension {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compiled glob matching every path whose final component ends in
/// `.<extension>`.
///
/// `*` never crosses a path separator and matching ignores ASCII case.
#[derive(Clone)]
pub struct PathPattern {
    glob: String,
    matcher: GlobMatcher,
}

impl PathPattern {
    /// Derive the pattern for an extension.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidExtension`] if the glob does not compile.
    pub fn for_extension(ext: &Extension) -> PluginResult<Self> {
        let glob = format!("**/*.{ext}");
        let matcher = GlobBuilder::new(&glob)
            .literal_separator(true)
            .case_insensitive(true)
            .build()
            .map_err(|e| PluginError::InvalidExtension(format!("{ext}: {e}")))?
            .compile_matcher();
        Ok(Self { glob, matcher })
    }

    /// Whether `path` matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }

    /// The glob source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.glob
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.glob).finish()
    }
}
