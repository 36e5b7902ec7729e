//! Plugin trait and lifecycle handle.
//!
//! A [`Plugin`] is whatever a loader produced from an artifact. The registry
//! and dispatcher never look inside it. Loaders wrap each plugin in a
//! [`LoadedPlugin`] via [`LoadedPlugin::initialize`], which is the only way
//! a plugin receives its name, host, storage directory and span.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{Span, debug, info_span};

use crate::host::Host;
use crate::plugin_dirs::plugin_storage_dir;

/// A unit of host-extending functionality.
///
/// Both hooks default to no-ops.
pub trait Plugin: Send {
    /// Called once, right after the issuing loader initializes the plugin.
    ///
    /// Runs inside the plugin's span, as does [`disable`](Self::disable).
    fn enable(&mut self, _ctx: &PluginContext) {}

    /// Called once before the plugin is destroyed.
    fn disable(&mut self, _ctx: &PluginContext) {}
}

/// Identity and environment assigned to a plugin by its loader.
#[derive(Clone)]
pub struct PluginContext {
    name: String,
    host: Arc<dyn Host>,
    storage_dir: PathBuf,
    span: Span,
}

impl PluginContext {
    /// Create a context whose storage directory is derived from the host's
    /// working directory: `<working_dir>/plugins/<name>`.
    ///
    /// The plugin's span is `plugin{name=<name>}`, created against the
    /// subscriber current at this call.
    #[must_use]
    pub fn new(host: Arc<dyn Host>, name: impl Into<String>) -> Self {
        let name = name.into();
        let storage_dir = plugin_storage_dir(host.working_dir(), &name);
        let span = info_span!("plugin", name = %name);
        Self {
            name,
            host,
            storage_dir,
            span,
        }
    }

    /// Override the derived storage directory.
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// The name the loader assigned to this plugin.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The host that owns this plugin.
    #[must_use]
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// The plugin's private storage directory (not created automatically).
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Span naming this plugin. Events recorded inside it carry the name.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("name", &self.name)
            .field("host", &self.host.name())
            .field("storage_dir", &self.storage_dir)
            .finish()
    }
}

struct Slot {
    plugin: Box<dyn Plugin>,
    enabled: bool,
}

/// A live plugin together with the context its loader assigned.
///
/// `disable` runs at most once: either through [`teardown`](Self::teardown)
/// when the loader unloads the plugin, or on drop if it never was.
pub struct LoadedPlugin {
    ctx: PluginContext,
    slot: Mutex<Slot>,
}

impl LoadedPlugin {
    /// Bind `plugin` to `ctx` and enable it.
    ///
    /// Loaders call this exactly once per plugin instance, before recording
    /// the plugin as loaded.
    pub fn initialize(ctx: PluginContext, plugin: impl Plugin + 'static) -> Arc<Self> {
        let mut plugin: Box<dyn Plugin> = Box::new(plugin);
        ctx.span.in_scope(|| {
            plugin.enable(&ctx);
            debug!(host = ctx.host.name(), "Plugin enabled");
        });
        Arc::new(Self {
            ctx,
            slot: Mutex::new(Slot {
                plugin,
                enabled: true,
            }),
        })
    }

    /// The plugin's assigned name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.ctx.name()
    }

    /// The owning host.
    #[must_use]
    pub fn host(&self) -> &Arc<dyn Host> {
        self.ctx.host()
    }

    /// The plugin's private storage directory.
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        self.ctx.storage_dir()
    }

    /// See [`PluginContext::span`].
    #[must_use]
    pub fn span(&self) -> &Span {
        self.ctx.span()
    }

    /// The full context.
    #[must_use]
    pub fn context(&self) -> &PluginContext {
        &self.ctx
    }

    /// Whether `disable` has not run yet.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).enabled
    }

    /// Run `disable` if it has not run yet. Returns whether it ran.
    pub fn teardown(&self) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if !slot.enabled {
            return false;
        }
        slot.enabled = false;
        let _entered = self.ctx.span.enter();
        slot.plugin.disable(&self.ctx);
        debug!("Plugin disabled");
        true
    }

    /// Run `f` with exclusive access to the plugin value, inside its span.
    pub fn with_plugin<R>(&self, f: impl FnOnce(&mut dyn Plugin) -> R) -> R {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let _entered = self.ctx.span.enter();
        f(slot.plugin.as_mut())
    }
}

impl Drop for LoadedPlugin {
    fn drop(&mut self) {
        let slot = self.slot.get_mut().unwrap_or_else(PoisonError::into_inner);
        if slot.enabled {
            slot.enabled = false;
            let _entered = self.ctx.span.enter();
            slot.plugin.disable(&self.ctx);
        }
    }
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("name", &self.ctx.name)
            .field("storage_dir", &self.ctx.storage_dir)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
