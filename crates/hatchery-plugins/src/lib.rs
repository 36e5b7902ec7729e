//! Extension-dispatched plugin loading for Hatchery hosts.
//!
//! A host registers loaders, each declaring the file extensions it handles,
//! and then hands artifact paths (or a whole directory) to the framework.
//! Each path is routed to the loader whose extension pattern matches it.
//!
//! - [`Extension`] / [`PathPattern`]: dispatch key and the glob derived from it
//! - [`Loader`]: contract every pluggable loader implements
//! - [`Plugin`] / [`LoadedPlugin`]: plugin lifecycle (enable/disable) and its handle
//! - [`LoaderRegistry`]: extension → loader table with overwrite policy
//! - [`Dispatcher`]: path → loader routing
//! - [`PluginManager`]: host-facing facade, including directory scans
//! - [`ManifestLoader`]: built-in loader for `*.toml` plugin descriptors
//!
//! # Registration
//!
//! At most one loader is bound to an extension. Registering a loader for an
//! extension that is already bound keeps the existing binding unless the
//! caller asks to overwrite. Overwriting never unloads the plugins the
//! previous loader produced.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod extension;
pub mod host;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod plugin;
pub mod plugin_dirs;
pub mod registry;

pub use discovery::{ScanFailure, ScanReport, scan_dir};
pub use dispatcher::{Dispatcher, IgnoredExtensions};
pub use error::{PluginError, PluginResult};
pub use extension::{Extension, PathPattern};
pub use host::{Host, HostInfo};
pub use loader::{DefaultLoader, Loader, LoaderContext, LoaderFactory, LoaderKind, PluginSet};
pub use manager::{PluginManager, PluginManagerBuilder};
pub use manifest::{ManifestLoader, ManifestPlugin, PluginDescriptor};
pub use plugin::{LoadedPlugin, Plugin, PluginContext};
pub use registry::{BindingMatch, LoaderRegistry};
