//! Mock loaders and plugins.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use hatchery_plugins::{
    Extension, Host, LoadedPlugin, Loader, LoaderContext, Plugin, PluginContext, PluginError,
    PluginResult, PluginSet,
};

/// Shared record of the paths a mock loader was asked to load.
#[derive(Debug, Clone, Default)]
pub struct LoadLog(Arc<Mutex<Vec<PathBuf>>>);

impl LoadLog {
    fn record(&self, path: &Path) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_path_buf());
    }

    /// Every recorded path, in call order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of load calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the loader was never called.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counts `enable`/`disable` calls across every [`MockPlugin`] sharing it.
#[derive(Debug, Default)]
pub struct LifecycleCounters {
    enabled: AtomicUsize,
    disabled: AtomicUsize,
}

impl LifecycleCounters {
    /// Number of `enable` calls.
    #[must_use]
    pub fn enabled(&self) -> usize {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Number of `disable` calls.
    #[must_use]
    pub fn disabled(&self) -> usize {
        self.disabled.load(Ordering::SeqCst)
    }
}

/// Plugin that only counts its lifecycle hooks.
#[derive(Debug, Clone, Default)]
pub struct MockPlugin {
    counters: Arc<LifecycleCounters>,
}

impl MockPlugin {
    /// Create a plugin reporting into `counters`.
    #[must_use]
    pub fn new(counters: Arc<LifecycleCounters>) -> Self {
        Self { counters }
    }
}

impl Plugin for MockPlugin {
    fn enable(&mut self, _ctx: &PluginContext) {
        self.counters.enabled.fetch_add(1, Ordering::SeqCst);
    }

    fn disable(&mut self, _ctx: &PluginContext) {
        self.counters.disabled.fetch_add(1, Ordering::SeqCst);
    }
}

/// Configures and produces [`MockLoader`] factories.
///
/// Clones share the same [`LoadLog`] and [`LifecycleCounters`], so keep one
/// around to observe a loader after handing its factory to a registry.
#[derive(Debug, Clone, Default)]
pub struct MockLoaderBuilder {
    extensions: Vec<String>,
    log: LoadLog,
    counters: Arc<LifecycleCounters>,
    fail_loads: bool,
    fail_instantiation: bool,
}

impl MockLoaderBuilder {
    /// Loader declaring `extensions`.
    #[must_use]
    pub fn new(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| (*e).to_owned()).collect(),
            ..Self::default()
        }
    }

    /// Make every `load` call fail with a load error.
    #[must_use]
    pub fn failing_loads(mut self) -> Self {
        self.fail_loads = true;
        self
    }

    /// Make the factory itself fail.
    #[must_use]
    pub fn failing_instantiation(mut self) -> Self {
        self.fail_instantiation = true;
        self
    }

    /// Handle on the paths the loader is asked to load.
    #[must_use]
    pub fn log(&self) -> LoadLog {
        self.log.clone()
    }

    /// Handle on the lifecycle counters of the plugins the loader produces.
    #[must_use]
    pub fn counters(&self) -> Arc<LifecycleCounters> {
        Arc::clone(&self.counters)
    }

    /// Factory producing a `MockLoader<T>`.
    ///
    /// Distinct `T` give distinct loader types, which is what
    /// unregistration matches on.
    pub fn factory<T: 'static>(self) -> impl FnOnce(&LoaderContext) -> PluginResult<MockLoader<T>> {
        move |ctx: &LoaderContext| MockLoader::new(ctx, self)
    }
}

/// Loader double that records calls and produces [`MockPlugin`]s.
///
/// The plugin name is the artifact's file stem.
pub struct MockLoader<T = ()> {
    host: Arc<dyn Host>,
    extensions: Vec<Extension>,
    plugins: PluginSet,
    log: LoadLog,
    counters: Arc<LifecycleCounters>,
    fail_loads: bool,
    _tag: PhantomData<fn() -> T>,
}

impl<T: 'static> MockLoader<T> {
    /// Build a loader from `builder` for the context's host.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Instantiation`] when the builder asks for it or
    /// an extension is invalid.
    pub fn new(ctx: &LoaderContext, builder: MockLoaderBuilder) -> PluginResult<Self> {
        if builder.fail_instantiation {
            return Err(PluginError::instantiation::<Self>("configured to fail"));
        }
        let extensions = builder
            .extensions
            .iter()
            .map(Extension::new)
            .collect::<PluginResult<Vec<_>>>()
            .map_err(PluginError::instantiation::<Self>)?;
        Ok(Self {
            host: Arc::clone(ctx.host()),
            extensions,
            plugins: PluginSet::new(),
            log: builder.log,
            counters: builder.counters,
            fail_loads: builder.fail_loads,
            _tag: PhantomData,
        })
    }
}

impl<T: 'static> Loader for MockLoader<T> {
    fn load(&self, path: &Path) -> PluginResult<Arc<LoadedPlugin>> {
        self.log.record(path);
        if self.fail_loads {
            return Err(PluginError::load(path, "mock loader configured to fail"));
        }
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| PluginError::load(path, "path has no file name"))?;
        let plugin = LoadedPlugin::initialize(
            PluginContext::new(Arc::clone(&self.host), name),
            MockPlugin::new(Arc::clone(&self.counters)),
        );
        self.plugins
            .insert(Arc::clone(&plugin))
            .map_err(|e| PluginError::load(path, e))?;
        Ok(plugin)
    }

    fn unload(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        self.plugins.remove(name)
    }

    fn loaded_plugins(&self) -> Vec<String> {
        self.plugins.names()
    }

    fn compatible_extensions(&self) -> &[Extension] {
        &self.extensions
    }
}

impl<T> std::fmt::Debug for MockLoader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLoader")
            .field("extensions", &self.extensions)
            .field("plugins", &self.plugins)
            .field("fail_loads", &self.fail_loads)
            .finish_non_exhaustive()
    }
}
