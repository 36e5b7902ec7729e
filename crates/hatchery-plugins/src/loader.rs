//! The loader contract.
//!
//! A [`Loader`] turns artifacts of the extensions it declares into live
//! plugins and keeps track of the plugins it owns. Loaders are built by a
//! [`LoaderFactory`] at registration time and shared as `Arc<dyn Loader>`,
//! so all bookkeeping goes through interior mutability ([`PluginSet`]).

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{PluginError, PluginResult};
use crate::extension::Extension;
use crate::host::Host;
use crate::plugin::LoadedPlugin;

/// Capability every pluggable loader implements.
pub trait Loader: Send + Sync + 'static {
    /// Load the artifact at `path`.
    ///
    /// On success the plugin has been initialized through
    /// [`LoadedPlugin::initialize`] and recorded as loaded by this loader.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Load`] carrying the path and the cause.
    fn load(&self, path: &Path) -> PluginResult<Arc<LoadedPlugin>>;

    /// Tear down and forget the plugin called `name`.
    ///
    /// Returns `None` if this loader has no plugin by that name.
    fn unload(&self, name: &str) -> Option<Arc<LoadedPlugin>>;

    /// Names of the plugins this loader currently owns, in no particular order.
    fn loaded_plugins(&self) -> Vec<String>;

    /// Extensions this loader handles.
    ///
    /// Queried once at registration; later changes are not observed.
    fn compatible_extensions(&self) -> &[Extension];
}

impl fmt::Debug for dyn Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("extensions", &self.compatible_extensions())
            .finish_non_exhaustive()
    }
}

/// Runtime identity of a loader's concrete type.
///
/// Two loaders have the same kind iff they are instances of the same Rust
/// type. Unregistration matches on kind.
#[derive(Debug, Clone, Copy)]
pub struct LoaderKind {
    id: TypeId,
    name: &'static str,
}

impl LoaderKind {
    /// The kind of loader type `L`.
    #[must_use]
    pub fn of<L: Loader>() -> Self {
        Self {
            id: TypeId::of::<L>(),
            name: std::any::type_name::<L>(),
        }
    }

    /// Fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for LoaderKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LoaderKind {}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// What a loader factory receives when it runs.
#[derive(Clone)]
pub struct LoaderContext {
    host: Arc<dyn Host>,
}

impl LoaderContext {
    /// Create a context for `host`.
    #[must_use]
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    /// The host that plugins built by this loader will belong to.
    #[must_use]
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }
}

impl fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderContext")
            .field("host", &self.host.name())
            .finish()
    }
}

/// Builds a loader at registration time.
///
/// Implemented for every `FnOnce(&LoaderContext) -> PluginResult<L>`.
/// A factory that fails should return [`PluginError::Instantiation`].
pub trait LoaderFactory<L: Loader>: FnOnce(&LoaderContext) -> PluginResult<L> {}

impl<L, F> LoaderFactory<L> for F
where
    L: Loader,
    F: FnOnce(&LoaderContext) -> PluginResult<L>,
{
}

/// A loader that can be built from the context alone.
///
/// Lets hosts register by type: `manager.register_loader::<MyLoader>()`.
pub trait DefaultLoader: Loader + Sized {
    /// Construct the loader.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Instantiation`] if construction fails.
    fn from_context(ctx: &LoaderContext) -> PluginResult<Self>;
}

/// Thread-safe name → plugin table for loaders to embed.
#[derive(Default)]
pub struct PluginSet {
    plugins: Mutex<HashMap<String, Arc<LoadedPlugin>>>,
}

impl PluginSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly initialized plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyLoaded`] if a plugin with the same name
    /// is already recorded. The set keeps the existing entry and drops its
    /// reference to `plugin`; the rejected plugin is disabled once the
    /// caller's last clone goes away.
    pub fn insert(&self, plugin: Arc<LoadedPlugin>) -> PluginResult<()> {
        let mut plugins = self.lock();
        if plugins.contains_key(plugin.name()) {
            return Err(PluginError::AlreadyLoaded(plugin.name().to_owned()));
        }
        plugins.insert(plugin.name().to_owned(), plugin);
        Ok(())
    }

    /// Whether a plugin with this name is recorded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Get a plugin by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        self.lock().get(name).cloned()
    }

    /// Forget a plugin and tear it down.
    pub fn remove(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        let removed = self.lock().remove(name)?;
        removed.teardown();
        Some(removed)
    }

    /// Forget and tear down every plugin.
    pub fn drain(&self) -> Vec<Arc<LoadedPlugin>> {
        let drained: Vec<_> = self.lock().drain().map(|(_, p)| p).collect();
        for plugin in &drained {
            plugin.teardown();
        }
        drained
    }

    /// Names of all recorded plugins.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of recorded plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no plugins are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<LoadedPlugin>>> {
        self.plugins.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginSet")
            .field("names", &self.names())
            .finish()
    }
}
