//! Built-in loader for declarative TOML plugin descriptors.
//!
//! A descriptor looks like:
//!
//! ```toml
//! [plugin]
//! name = "greeter"
//! version = "0.1.0"
//! description = "Says hello"
//! ```
//!
//! Every field is optional; the name defaults to the file stem. Nothing is
//! executed: the resulting plugin only owns its storage directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PluginError, PluginResult};
use crate::extension::Extension;
use crate::loader::{DefaultLoader, Loader, LoaderContext, PluginSet};
use crate::plugin::{LoadedPlugin, Plugin, PluginContext};
use crate::plugin_dirs::ensure_storage_dir;

/// Maximum descriptor size in bytes (64 KiB).
pub const MAX_MANIFEST_SIZE: u64 = 65_536;

/// Extension claimed by [`ManifestLoader`].
pub const MANIFEST_EXTENSION: &str = "toml";

/// The `[plugin]` table of a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginDescriptor {
    /// Plugin name. Defaults to the file stem.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form version string.
    #[serde(default)]
    pub version: Option<String>,
    /// One-line description.
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
struct ManifestFile {
    plugin: PluginDescriptor,
}

impl PluginDescriptor {
    /// Parse a descriptor document.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the document is malformed or has no
    /// `[plugin]` table.
    pub fn parse(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<ManifestFile>(source).map(|file| file.plugin)
    }

    /// Resolve the plugin name for a descriptor read from `path`.
    fn resolve_name(&self, path: &Path) -> Result<String, String> {
        let name = match &self.name {
            Some(name) => name.trim().to_owned(),
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| "file name is not valid UTF-8".to_owned())?
                .to_owned(),
        };
        validate_name(&name)?;
        Ok(name)
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("plugin name must not be empty".into());
    }
    if name == "." || name == ".." {
        return Err(format!("plugin name is reserved: {name}"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(format!(
            "plugin name must contain only alphanumeric characters and '-_.', got: {name}"
        ));
    }
    Ok(())
}

/// Plugin produced by [`ManifestLoader`].
#[derive(Debug)]
pub struct ManifestPlugin {
    descriptor: PluginDescriptor,
    source: PathBuf,
}

impl ManifestPlugin {
    /// The parsed descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// Path the descriptor was read from.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl Plugin for ManifestPlugin {
    fn enable(&mut self, ctx: &PluginContext) {
        if let Err(e) = ensure_storage_dir(ctx.storage_dir()) {
            warn!(
                plugin = ctx.name(),
                dir = %ctx.storage_dir().display(),
                error = %e,
                "Failed to create plugin storage directory"
            );
        }
    }

    fn disable(&mut self, ctx: &PluginContext) {
        debug!(plugin = ctx.name(), source = %self.source.display(), "Manifest plugin disabled");
    }
}

/// Loads `*.toml` plugin descriptors.
#[derive(Debug)]
pub struct ManifestLoader {
    ctx: LoaderContext,
    extensions: Vec<Extension>,
    plugins: PluginSet,
    descriptors: Mutex<HashMap<String, PluginDescriptor>>,
}

impl ManifestLoader {
    /// Create a loader serving the context's host.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Instantiation`] if the built-in extension is
    /// rejected.
    pub fn new(ctx: &LoaderContext) -> PluginResult<Self> {
        let ext =
            Extension::new(MANIFEST_EXTENSION).map_err(PluginError::instantiation::<Self>)?;
        Ok(Self {
            ctx: ctx.clone(),
            extensions: vec![ext],
            plugins: PluginSet::new(),
            descriptors: Mutex::new(HashMap::new()),
        })
    }

    /// Descriptor of a loaded plugin.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<PluginDescriptor> {
        self.descriptors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn read_descriptor(path: &Path) -> PluginResult<PluginDescriptor> {
        let len = std::fs::metadata(path)
            .map_err(|e| PluginError::load(path, e))?
            .len();
        if len > MAX_MANIFEST_SIZE {
            return Err(PluginError::load(
                path,
                format!("descriptor is {len} bytes, limit is {MAX_MANIFEST_SIZE}"),
            ));
        }
        let source = std::fs::read_to_string(path).map_err(|e| PluginError::load(path, e))?;
        PluginDescriptor::parse(&source).map_err(|e| PluginError::load(path, e))
    }
}

impl DefaultLoader for ManifestLoader {
    fn from_context(ctx: &LoaderContext) -> PluginResult<Self> {
        Self::new(ctx)
    }
}

impl Loader for ManifestLoader {
    fn load(&self, path: &Path) -> PluginResult<Arc<LoadedPlugin>> {
        let descriptor = Self::read_descriptor(path)?;
        let name = descriptor
            .resolve_name(path)
            .map_err(|e| PluginError::load(path, e))?;
        if self.plugins.contains(&name) {
            return Err(PluginError::load(path, PluginError::AlreadyLoaded(name)));
        }

        let ctx = PluginContext::new(Arc::clone(self.ctx.host()), name.clone());
        let plugin = LoadedPlugin::initialize(
            ctx,
            ManifestPlugin {
                descriptor: descriptor.clone(),
                source: path.to_path_buf(),
            },
        );
        self.plugins
            .insert(Arc::clone(&plugin))
            .map_err(|e| PluginError::load(path, e))?;
        self.descriptors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, descriptor);
        Ok(plugin)
    }

    fn unload(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        let removed = self.plugins.remove(name)?;
        self.descriptors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        Some(removed)
    }

    fn loaded_plugins(&self) -> Vec<String> {
        self.plugins.names()
    }

    fn compatible_extensions(&self) -> &[Extension] {
        &self.extensions
    }
}
