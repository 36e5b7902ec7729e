//! Path → loader dispatch.
//!
//! The dispatcher resolves an artifact path to the loader whose pattern
//! claims it and delegates to that loader. It holds no state of its own
//! beyond the set of extensions that are expected to go unclaimed.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::PluginResult;
use crate::extension::Extension;
use crate::loader::{Loader, LoaderKind};
use crate::plugin::LoadedPlugin;
use crate::registry::{LoaderRegistry, same_instance};

/// Extension ignored by default: archives that sit next to plugins but are
/// handled elsewhere.
pub const DEFAULT_IGNORED_EXTENSION: &str = "jar";

/// Extensions for which "no loader found" is expected and not logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredExtensions(BTreeSet<Extension>);

impl IgnoredExtensions {
    /// Build a set from raw extension strings.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidExtension`](crate::PluginError::InvalidExtension)
    /// for the first entry that fails normalization.
    pub fn new<I, S>(extensions: I) -> PluginResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        extensions
            .into_iter()
            .map(Extension::new)
            .collect::<PluginResult<BTreeSet<_>>>()
            .map(Self)
    }

    /// A set that ignores nothing.
    #[must_use]
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Whether an unclaimed `path` should pass silently.
    ///
    /// A path with no extension is never ignorable.
    #[must_use]
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.0.iter().any(|ext| ext.is_suffix_of(path))
    }

    /// Whether `extension` is in the set.
    #[must_use]
    pub fn contains(&self, extension: &Extension) -> bool {
        self.0.contains(extension)
    }

    /// Iterate over the set in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.0.iter()
    }
}

impl Default for IgnoredExtensions {
    fn default() -> Self {
        Self(Extension::new(DEFAULT_IGNORED_EXTENSION).into_iter().collect())
    }
}

/// Routes load and unload requests to registered loaders.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<LoaderRegistry>,
    ignored: IgnoredExtensions,
}

impl Dispatcher {
    /// Create a dispatcher over `registry` with the default ignored set.
    #[must_use]
    pub fn new(registry: Arc<LoaderRegistry>) -> Self {
        Self {
            registry,
            ignored: IgnoredExtensions::default(),
        }
    }

    /// Replace the ignored extension set.
    #[must_use]
    pub fn with_ignored(mut self, ignored: IgnoredExtensions) -> Self {
        self.ignored = ignored;
        self
    }

    /// The registry this dispatcher reads from.
    #[must_use]
    pub fn registry(&self) -> &Arc<LoaderRegistry> {
        &self.registry
    }

    /// Extensions that go unclaimed silently.
    #[must_use]
    pub fn ignored(&self) -> &IgnoredExtensions {
        &self.ignored
    }

    /// Load `path` with the loader whose pattern matches it.
    ///
    /// Returns `Ok(None)` when no loader claims the path. That case is logged
    /// as a warning unless the path's extension is ignorable.
    ///
    /// # Errors
    ///
    /// Propagates the loader's [`PluginError::Load`](crate::PluginError::Load).
    pub fn dispatch_load(&self, path: &Path) -> PluginResult<Option<Arc<LoadedPlugin>>> {
        // The table lock is released once find_match returns.
        let Some(hit) = self.registry.find_match(path) else {
            if self.ignored.is_ignored(path) {
                debug!(path = %path.display(), "Ignoring unclaimed artifact");
            } else {
                warn!(path = %path.display(), "No loader found for plugin artifact");
            }
            return Ok(None);
        };

        let plugin = hit.loader.load(path)?;
        debug!(
            path = %path.display(),
            plugin = plugin.name(),
            loader = %hit.kind,
            "Dispatched load"
        );
        Ok(Some(plugin))
    }

    /// Unload `name` through the bound loaders of type `L`.
    ///
    /// Several instances of one type can be bound under different
    /// extensions; each is asked in extension order until one owns `name`.
    #[must_use]
    pub fn unload_with<L: Loader>(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        let kind = LoaderKind::of::<L>();
        let unloaded = self
            .registry
            .loaders_of_kind(kind)
            .iter()
            .find_map(|loader| loader.unload(name));
        if unloaded.is_none() {
            debug!(loader = %kind, plugin = name, "No bound loader of this type holds the plugin");
        }
        unloaded
    }

    /// Unload `name` through a specific loader instance.
    ///
    /// The loader does not have to be bound any more: plugins outlive the
    /// binding of the loader that produced them.
    #[must_use]
    pub fn unload_from(&self, loader: &Arc<dyn Loader>, name: &str) -> Option<Arc<LoadedPlugin>> {
        if !self.is_bound(loader) {
            debug!(plugin = name, "Unloading through a loader that is no longer bound");
        }
        loader.unload(name)
    }

    /// Unload `name` through whichever bound loader owns it.
    ///
    /// Distinct loaders are asked in extension order; the first hit wins.
    #[must_use]
    pub fn unload_any(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        self.registry
            .distinct_loaders()
            .iter()
            .find_map(|loader| loader.unload(name))
    }

    /// Whether `loader` is currently bound in the registry.
    #[must_use]
    pub fn is_bound(&self, loader: &Arc<dyn Loader>) -> bool {
        self.registry
            .distinct_loaders()
            .iter()
            .any(|bound| same_instance(bound, loader))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;
    use crate::error::PluginError;
    use crate::host::{Host, HostInfo};
    use crate::loader::{LoaderContext, PluginSet};
    use crate::plugin::{Plugin, PluginContext};

    struct Inert;
    impl Plugin for Inert {}

    /// Records every path it was asked to load.
    struct RecordingLoader {
        host: Arc<dyn Host>,
        extensions: Vec<Extension>,
        plugins: PluginSet,
        seen: Arc<Mutex<Vec<PathBuf>>>,
        fail: bool,
    }

    impl RecordingLoader {
        fn new(ctx: &LoaderContext, ext: &str, seen: &Arc<Mutex<Vec<PathBuf>>>) -> Self {
            Self {
                host: Arc::clone(ctx.host()),
                extensions: vec![Extension::new(ext).unwrap()],
                plugins: PluginSet::new(),
                seen: Arc::clone(seen),
                fail: false,
            }
        }
    }

    impl Loader for RecordingLoader {
        fn load(&self, path: &Path) -> PluginResult<Arc<LoadedPlugin>> {
            self.seen.lock().unwrap().push(path.to_path_buf());
            if self.fail {
                return Err(PluginError::load(path, "corrupt artifact"));
            }
            let name = path.file_stem().unwrap().to_string_lossy().into_owned();
            let plugin = LoadedPlugin::initialize(PluginContext::new(Arc::clone(&self.host), name), Inert);
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

    struct OtherLoader(RecordingLoader);

    impl Loader for OtherLoader {
        fn load(&self, path: &Path) -> PluginResult<Arc<LoadedPlugin>> {
            self.0.load(path)
        }

        fn unload(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
            self.0.unload(name)
        }

        fn loaded_plugins(&self) -> Vec<String> {
            self.0.loaded_plugins()
        }

        fn compatible_extensions(&self) -> &[Extension] {
            self.0.compatible_extensions()
        }
    }

    type Seen = Arc<Mutex<Vec<PathBuf>>>;

    fn setup() -> (Dispatcher, Seen, Seen) {
        let registry = Arc::new(LoaderRegistry::new(Arc::new(HostInfo::new("test-host", "/srv/host"))));
        let foo_seen: Seen = Arc::default();
        let bar_seen: Seen = Arc::default();
        let f = Arc::clone(&foo_seen);
        assert!(registry.register(move |ctx: &LoaderContext| Ok(RecordingLoader::new(ctx, "foo", &f)), false));
        let b = Arc::clone(&bar_seen);
        assert!(registry.register(
            move |ctx: &LoaderContext| Ok(OtherLoader(RecordingLoader::new(ctx, "bar", &b))),
            false
        ));
        (Dispatcher::new(registry), foo_seen, bar_seen)
    }

    #[test]
    fn dispatches_to_matching_loader_only() {
        let (dispatcher, foo_seen, bar_seen) = setup();

        let plugin = dispatcher.dispatch_load(Path::new("/p/x.foo")).unwrap().unwrap();
        assert_eq!(plugin.name(), "x");
        assert_eq!(foo_seen.lock().unwrap().len(), 1);
        assert!(bar_seen.lock().unwrap().is_empty());
    }

    #[test]
    fn unmatched_path_invokes_no_loader() {
        let (dispatcher, foo_seen, bar_seen) = setup();

        assert!(dispatcher.dispatch_load(Path::new("/p/x.baz")).unwrap().is_none());
        assert!(dispatcher.dispatch_load(Path::new("/p/README")).unwrap().is_none());
        assert!(dispatcher.dispatch_load(Path::new("/p/a.jar")).unwrap().is_none());
        assert!(foo_seen.lock().unwrap().is_empty());
        assert!(bar_seen.lock().unwrap().is_empty());
    }

    #[test]
    fn matching_ignores_case() {
        let (dispatcher, foo_seen, _) = setup();
        assert!(dispatcher.dispatch_load(Path::new("/p/Upper.FOO")).unwrap().is_some());
        assert_eq!(foo_seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn loader_failure_is_propagated() {
        let registry = Arc::new(LoaderRegistry::new(Arc::new(HostInfo::new("test-host", "/srv/host"))));
        let seen: Seen = Arc::default();
        let s = Arc::clone(&seen);
        assert!(registry.register(
            move |ctx: &LoaderContext| {
                let mut loader = RecordingLoader::new(ctx, "foo", &s);
                loader.fail = true;
                Ok(loader)
            },
            false
        ));
        let dispatcher = Dispatcher::new(registry);

        let err = dispatcher.dispatch_load(Path::new("/p/x.foo")).unwrap_err();
        assert!(matches!(err, PluginError::Load { ref path, .. } if path == Path::new("/p/x.foo")));
    }

    #[test]
    fn round_trip_load_then_unload() {
        let (dispatcher, _, _) = setup();
        let plugin = dispatcher.dispatch_load(Path::new("/p/x.bar")).unwrap().unwrap();

        let unloaded = dispatcher.unload_with::<OtherLoader>(plugin.name()).unwrap();
        assert_eq!(unloaded.name(), plugin.name());
        assert!(!unloaded.is_enabled());
        assert!(dispatcher.unload_with::<OtherLoader>("x").is_none());
    }

    #[test]
    fn unload_by_instance_and_by_name() {
        let (dispatcher, _, _) = setup();
        dispatcher.dispatch_load(Path::new("/p/one.foo")).unwrap();
        dispatcher.dispatch_load(Path::new("/p/two.bar")).unwrap();

        let foo = dispatcher.registry().lookup("foo").unwrap();
        assert!(dispatcher.is_bound(&foo));
        assert!(dispatcher.unload_from(&foo, "two").is_none());
        assert_eq!(dispatcher.unload_from(&foo, "one").unwrap().name(), "one");

        assert_eq!(dispatcher.unload_any("two").unwrap().name(), "two");
        assert!(dispatcher.unload_any("two").is_none());
    }

    #[test]
    fn unload_with_reaches_every_instance_of_the_type() {
        let registry = Arc::new(LoaderRegistry::new(Arc::new(HostInfo::new("test-host", "/srv/host"))));
        let seen: Seen = Arc::default();
        let s = Arc::clone(&seen);
        assert!(registry.register(move |ctx: &LoaderContext| Ok(RecordingLoader::new(ctx, "jar", &s)), false));
        let s = Arc::clone(&seen);
        assert!(registry.register(move |ctx: &LoaderContext| Ok(RecordingLoader::new(ctx, "war", &s)), false));
        assert_eq!(registry.loaders_of_kind(LoaderKind::of::<RecordingLoader>()).len(), 2);
        let dispatcher = Dispatcher::new(registry);

        dispatcher.dispatch_load(Path::new("/d/x.war")).unwrap().unwrap();
        let war = dispatcher.registry().lookup("war").unwrap();
        assert_eq!(war.loaded_plugins(), vec!["x".to_owned()]);

        let unloaded = dispatcher.unload_with::<RecordingLoader>("x").unwrap();
        assert_eq!(unloaded.name(), "x");
        assert!(!unloaded.is_enabled());
        assert!(war.loaded_plugins().is_empty());
        assert!(dispatcher.unload_with::<RecordingLoader>("x").is_none());
    }

    #[test]
    fn unload_with_unbound_type_is_none() {
        let (dispatcher, _, _) = setup();
        dispatcher.dispatch_load(Path::new("/p/x.bar")).unwrap();
        assert!(dispatcher.registry().unregister::<OtherLoader>());
        assert!(dispatcher.unload_with::<OtherLoader>("x").is_none());
    }

    #[test]
    fn ignored_extensions_default_and_custom() {
        let ignored = IgnoredExtensions::default();
        assert!(ignored.is_ignored(Path::new("lib/a.jar")));
        assert!(ignored.is_ignored(Path::new("lib/A.JAR")));
        assert!(!ignored.is_ignored(Path::new("lib/a.txt")));
        assert!(!ignored.is_ignored(Path::new("lib/README")));
        assert!(!ignored.is_ignored(Path::new("lib/jar")));

        let custom = IgnoredExtensions::new([".MD", "tar.gz"]).unwrap();
        assert!(custom.is_ignored(Path::new("README.md")));
        assert!(custom.is_ignored(Path::new("bundle.tar.gz")));
        assert!(!custom.is_ignored(Path::new("a.jar")));
        assert!(custom.contains(&Extension::new("md").unwrap()));

        assert!(IgnoredExtensions::new(["ok", "bad/ext"]).is_err());
        assert!(!IgnoredExtensions::none().is_ignored(Path::new("a.jar")));
    }
}
