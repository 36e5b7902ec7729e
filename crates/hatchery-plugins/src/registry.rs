//! Loader registry.
//!
//! Maps each bound [`Extension`] to its [`PathPattern`] and the loader
//! responsible for it. The whole table sits behind one `RwLock`, and each
//! entry stores pattern and loader together, so no reader can observe an
//! extension whose pattern has no loader or the reverse.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error, info, warn};

use crate::extension::{Extension, PathPattern};
use crate::host::Host;
use crate::loader::{DefaultLoader, Loader, LoaderContext, LoaderFactory, LoaderKind};

/// One row of the loader table.
struct LoaderBinding {
    pattern: PathPattern,
    kind: LoaderKind,
    loader: Arc<dyn Loader>,
}

/// The binding that claimed a path.
#[derive(Clone)]
pub struct BindingMatch {
    /// Extension whose pattern matched.
    pub extension: Extension,
    /// Type of the bound loader.
    pub kind: LoaderKind,
    /// The bound loader instance.
    pub loader: Arc<dyn Loader>,
}

impl fmt::Debug for BindingMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingMatch")
            .field("extension", &self.extension)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Extension → loader table.
///
/// At most one loader is bound to an extension at any time. Construct one
/// per host and share it behind an `Arc`.
pub struct LoaderRegistry {
    ctx: LoaderContext,
    bindings: RwLock<BTreeMap<Extension, LoaderBinding>>,
}

impl LoaderRegistry {
    /// Create an empty registry whose loaders will serve `host`.
    #[must_use]
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            ctx: LoaderContext::new(host),
            bindings: RwLock::new(BTreeMap::new()),
        }
    }

    /// The context handed to loader factories.
    #[must_use]
    pub fn context(&self) -> &LoaderContext {
        &self.ctx
    }

    /// Build a loader with `factory` and bind it to every extension it
    /// declares.
    ///
    /// For each declared extension:
    /// - unbound: a new pattern is bound to the loader;
    /// - bound and `overwrite`: the existing binding is repointed at the new
    ///   loader (the old loader is not unloaded);
    /// - bound and not `overwrite`: the existing binding is kept and a
    ///   conflict is logged.
    ///
    /// Returns `true` iff at least one extension was newly bound or
    /// overwritten. A factory error is logged and yields `false` without
    /// touching the table.
    pub fn register<L, F>(&self, factory: F, overwrite: bool) -> bool
    where
        L: Loader,
        F: LoaderFactory<L>,
    {
        let kind = LoaderKind::of::<L>();
        let loader = match factory(&self.ctx) {
            Ok(loader) => loader,
            Err(e) => {
                error!(loader = kind.name(), error = %e, "Failed to instantiate loader");
                return false;
            },
        };
        self.bind(kind, Arc::new(loader), overwrite)
    }

    /// Register a loader that builds itself from the context.
    pub fn register_default<L: DefaultLoader>(&self, overwrite: bool) -> bool {
        self.register(L::from_context, overwrite)
    }

    fn bind(&self, kind: LoaderKind, loader: Arc<dyn Loader>, overwrite: bool) -> bool {
        let extensions: BTreeSet<Extension> =
            loader.compatible_extensions().iter().cloned().collect();
        if extensions.is_empty() {
            warn!(loader = kind.name(), "Loader declares no compatible extensions");
            return false;
        }

        let mut table = self.write();
        let mut bound = false;
        for ext in extensions {
            match table.get_mut(&ext) {
                Some(existing) if overwrite => {
                    info!(
                        extension = %ext,
                        old_loader = existing.kind.name(),
                        new_loader = kind.name(),
                        "Overwriting loader"
                    );
                    existing.kind = kind;
                    existing.loader = Arc::clone(&loader);
                    bound = true;
                },
                Some(existing) => {
                    warn!(
                        extension = %ext,
                        bound_loader = existing.kind.name(),
                        rejected_loader = kind.name(),
                        "Extension already bound to another loader"
                    );
                },
                None => {
                    let pattern = match PathPattern::for_extension(&ext) {
                        Ok(pattern) => pattern,
                        Err(e) => {
                            warn!(extension = %ext, error = %e, "Skipping extension with unusable pattern");
                            continue;
                        },
                    };
                    info!(extension = %ext, loader = %kind, "Registered loader");
                    table.insert(
                        ext,
                        LoaderBinding {
                            pattern,
                            kind,
                            loader: Arc::clone(&loader),
                        },
                    );
                    bound = true;
                },
            }
        }
        bound
    }

    /// Remove every binding held by a loader of type `L`.
    ///
    /// Returns `true` iff at least one binding was removed. Plugins owned by
    /// the removed loaders are not unloaded.
    pub fn unregister<L: Loader>(&self) -> bool {
        self.unregister_kind(LoaderKind::of::<L>())
    }

    /// Remove every binding held by a loader of `kind`.
    pub fn unregister_kind(&self, kind: LoaderKind) -> bool {
        let mut table = self.write();
        let before = table.len();
        table.retain(|ext, binding| {
            if binding.kind == kind {
                info!(extension = %ext, loader = %kind, "Unregistered loader");
                false
            } else {
                true
            }
        });
        table.len() != before
    }

    /// Loader bound to `extension`, if any.
    ///
    /// `extension` is normalized first; a value that fails normalization
    /// looks up as unbound.
    #[must_use]
    pub fn lookup(&self, extension: &str) -> Option<Arc<dyn Loader>> {
        let ext = Extension::new(extension).ok()?;
        self.lookup_extension(&ext)
    }

    /// Loader bound to an already normalized extension.
    #[must_use]
    pub fn lookup_extension(&self, extension: &Extension) -> Option<Arc<dyn Loader>> {
        self.read()
            .get(extension)
            .map(|binding| Arc::clone(&binding.loader))
    }

    /// Type of the loader bound to `extension`.
    #[must_use]
    pub fn kind_for(&self, extension: &str) -> Option<LoaderKind> {
        let ext = Extension::new(extension).ok()?;
        self.read().get(&ext).map(|binding| binding.kind)
    }

    /// Snapshot of bound loaders, one entry per binding.
    ///
    /// A loader bound to several extensions appears once per extension.
    /// Use [`distinct_loaders`](Self::distinct_loaders) for unique instances.
    #[must_use]
    pub fn all_loaders(&self) -> Vec<Arc<dyn Loader>> {
        self.read()
            .values()
            .map(|binding| Arc::clone(&binding.loader))
            .collect()
    }

    /// Snapshot of bound loader instances, each listed once.
    #[must_use]
    pub fn distinct_loaders(&self) -> Vec<Arc<dyn Loader>> {
        dedup_instances(self.read().values().map(|binding| &binding.loader))
    }

    /// Distinct bound instances of loader type `kind`.
    #[must_use]
    pub fn loaders_of_kind(&self, kind: LoaderKind) -> Vec<Arc<dyn Loader>> {
        dedup_instances(
            self.read()
                .values()
                .filter(|binding| binding.kind == kind)
                .map(|binding| &binding.loader),
        )
    }

    /// Sorted snapshot of bound extensions.
    #[must_use]
    pub fn extensions(&self) -> Vec<Extension> {
        self.read().keys().cloned().collect()
    }

    /// Find the binding whose pattern matches `path`.
    ///
    /// When several patterns match (`gz` and `tar.gz` for `x.tar.gz`), the
    /// longest extension wins.
    #[must_use]
    pub fn find_match(&self, path: &Path) -> Option<BindingMatch> {
        let table = self.read();
        let (ext, binding) = table
            .iter()
            .filter(|(_, binding)| binding.pattern.matches(path))
            .max_by_key(|(ext, _)| ext.as_str().len())?;
        debug!(path = %path.display(), extension = %ext, loader = %binding.kind, "Matched loader");
        Some(BindingMatch {
            extension: ext.clone(),
            kind: binding.kind,
            loader: Arc::clone(&binding.loader),
        })
    }

    /// Number of bound extensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no extension is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Extension, LoaderBinding>> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<Extension, LoaderBinding>> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn dedup_instances<'a>(loaders: impl Iterator<Item = &'a Arc<dyn Loader>>) -> Vec<Arc<dyn Loader>> {
    let mut seen: Vec<Arc<dyn Loader>> = Vec::new();
    for loader in loaders {
        if !seen.iter().any(|s| same_instance(s, loader)) {
            seen.push(Arc::clone(loader));
        }
    }
    seen
}

/// Identity comparison that ignores vtable pointers.
pub(crate) fn same_instance(a: &Arc<dyn Loader>, b: &Arc<dyn Loader>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.read();
        f.debug_struct("LoaderRegistry")
            .field("binding_count", &table.len())
            .field(
                "bindings",
                &table
                    .iter()
                    .map(|(ext, binding)| (ext.as_str(), binding.kind.short_name()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
