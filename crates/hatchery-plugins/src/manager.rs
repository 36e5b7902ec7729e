//! Host-facing facade.
//!
//! A [`PluginManager`] bundles the loader registry, the dispatcher, and the
//! host description. Applications create one per process and call into it;
//! there is no global registry.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::discovery::{ScanFailure, ScanReport, scan_dir};
use crate::dispatcher::{Dispatcher, IgnoredExtensions};
use crate::error::PluginResult;
use crate::host::Host;
use crate::loader::{DefaultLoader, Loader, LoaderFactory};
use crate::plugin::LoadedPlugin;
use crate::registry::LoaderRegistry;

/// Builder for [`PluginManager`].
#[derive(Debug)]
#[must_use]
pub struct PluginManagerBuilder {
    host: Arc<dyn Host>,
    ignored: IgnoredExtensions,
}

impl PluginManagerBuilder {
    /// Set the extensions whose unclaimed artifacts are not logged.
    pub fn ignored_extensions(mut self, ignored: IgnoredExtensions) -> Self {
        self.ignored = ignored;
        self
    }

    /// Build the manager. No loaders are registered yet.
    #[must_use]
    pub fn build(self) -> PluginManager {
        let registry = Arc::new(LoaderRegistry::new(Arc::clone(&self.host)));
        let dispatcher = Dispatcher::new(Arc::clone(&registry)).with_ignored(self.ignored);
        PluginManager {
            host: self.host,
            registry,
            dispatcher,
        }
    }
}

/// Entry point for applications that host plugins.
#[derive(Debug)]
pub struct PluginManager {
    host: Arc<dyn Host>,
    registry: Arc<LoaderRegistry>,
    dispatcher: Dispatcher,
}

impl PluginManager {
    /// Start building a manager for `host`.
    pub fn builder(host: Arc<dyn Host>) -> PluginManagerBuilder {
        PluginManagerBuilder {
            host,
            ignored: IgnoredExtensions::default(),
        }
    }

    /// Manager for `host` with default settings.
    #[must_use]
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self::builder(host).build()
    }

    /// The host plugins belong to.
    #[must_use]
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// The loader table.
    #[must_use]
    pub fn registry(&self) -> &Arc<LoaderRegistry> {
        &self.registry
    }

    /// The dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Register loader type `L` without overwriting existing bindings.
    pub fn register_loader<L: DefaultLoader>(&self) -> bool {
        self.registry.register_default::<L>(false)
    }

    /// Register a loader built by `factory`.
    pub fn register_loader_with<L, F>(&self, factory: F, overwrite: bool) -> bool
    where
        L: Loader,
        F: LoaderFactory<L>,
    {
        self.registry.register(factory, overwrite)
    }

    /// Remove every binding held by loaders of type `L`.
    pub fn unregister_loader<L: Loader>(&self) -> bool {
        self.registry.unregister::<L>()
    }

    /// Loader bound to `extension`.
    #[must_use]
    pub fn loader_for(&self, extension: &str) -> Option<Arc<dyn Loader>> {
        self.registry.lookup(extension)
    }

    /// Snapshot of bound loaders, one entry per bound extension.
    #[must_use]
    pub fn loaders(&self) -> Vec<Arc<dyn Loader>> {
        self.registry.all_loaders()
    }

    /// Load a single artifact.
    ///
    /// # Errors
    ///
    /// Propagates the claiming loader's [`PluginError::Load`](crate::PluginError::Load).
    pub fn load_plugin(&self, path: &Path) -> PluginResult<Option<Arc<LoadedPlugin>>> {
        self.dispatcher.dispatch_load(path)
    }

    /// Load every artifact directly inside `root`.
    ///
    /// Per-file load failures are logged and collected in the report.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::ScanFailed`](crate::PluginError::ScanFailed) if
    /// `root` cannot be read.
    pub fn load_plugins(&self, root: &Path) -> PluginResult<ScanReport> {
        let mut report = ScanReport::default();
        for path in scan_dir(root)? {
            match self.dispatcher.dispatch_load(&path) {
                Ok(Some(plugin)) => report.loaded.push(plugin),
                Ok(None) => report.skipped.push(path),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "Failed to load plugin");
                    report.failed.push(ScanFailure { path, error });
                },
            }
        }
        info!(
            dir = %root.display(),
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Plugin scan complete"
        );
        Ok(report)
    }

    /// Unload the plugin called `name` from whichever bound loader owns it.
    #[must_use]
    pub fn unload_plugin(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        self.dispatcher.unload_any(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginError;
    use crate::extension::Extension;
    use crate::host::HostInfo;
    use crate::loader::{LoaderContext, PluginSet};
    use crate::plugin::{Plugin, PluginContext};

    struct Inert;
    impl Plugin for Inert {}

    /// Loads `*.foo`; files whose content is `broken` fail.
    struct FooLoader {
        ctx: LoaderContext,
        extensions: Vec<Extension>,
        plugins: PluginSet,
    }

    impl Loader for FooLoader {
        fn load(&self, path: &Path) -> PluginResult<Arc<LoadedPlugin>> {
            let body = std::fs::read_to_string(path).map_err(|e| PluginError::load(path, e))?;
            if body.trim() == "broken" {
                return Err(PluginError::load(path, "broken artifact"));
            }
            let name = path.file_stem().unwrap().to_string_lossy().into_owned();
            let plugin = LoadedPlugin::initialize(PluginContext::new(Arc::clone(self.ctx.host()), name), Inert);
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

    impl DefaultLoader for FooLoader {
        fn from_context(ctx: &LoaderContext) -> PluginResult<Self> {
            Ok(Self {
                ctx: ctx.clone(),
                extensions: vec![Extension::new("foo")?],
                plugins: PluginSet::new(),
            })
        }
    }

    fn manager(dir: &Path) -> PluginManager {
        PluginManager::new(Arc::new(HostInfo::new("test-host", dir)))
    }

    #[test]
    fn register_lookup_unregister() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = manager(tmp.path());
        assert!(mgr.register_loader::<FooLoader>());
        assert!(!mgr.register_loader::<FooLoader>());
        assert!(mgr.loader_for("foo").is_some());
        assert_eq!(mgr.loaders().len(), 1);

        assert!(mgr.register_loader_with(FooLoader::from_context, true));
        assert!(mgr.unregister_loader::<FooLoader>());
        assert!(mgr.loader_for("foo").is_none());
        assert!(mgr.loaders().is_empty());
    }

    #[test]
    fn load_plugins_sorts_outcomes() {
        let tmp = tempfile::tempdir().unwrap();
        let plugins = tmp.path().join("plugins-src");
        std::fs::create_dir(&plugins).unwrap();
        std::fs::write(plugins.join("good.foo"), "ok").unwrap();
        std::fs::write(plugins.join("bad.foo"), "broken").unwrap();
        std::fs::write(plugins.join("a.jar"), "").unwrap();
        std::fs::write(plugins.join("notes.txt"), "").unwrap();

        let mgr = manager(tmp.path());
        assert!(mgr.register_loader::<FooLoader>());
        let report = mgr.load_plugins(&plugins).unwrap();

        assert_eq!(report.loaded_names(), vec!["good"]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, plugins.join("bad.foo"));
        assert!(!report.is_clean());

        let unloaded = mgr.unload_plugin("good").unwrap();
        assert_eq!(unloaded.name(), "good");
        assert!(mgr.unload_plugin("good").is_none());
    }

    #[test]
    fn unreadable_root_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = manager(tmp.path());
        let err = mgr.load_plugins(&tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, PluginError::ScanFailed { .. }));
    }

    #[test]
    fn custom_ignored_set_is_applied() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = PluginManager::builder(Arc::new(HostInfo::new("test-host", tmp.path())))
            .ignored_extensions(IgnoredExtensions::new(["txt"]).unwrap())
            .build();
        assert!(mgr.dispatcher().ignored().is_ignored(Path::new("a.txt")));
        assert!(!mgr.dispatcher().ignored().is_ignored(Path::new("a.jar")));
        assert_eq!(mgr.host().name(), "test-host");
    }
}
