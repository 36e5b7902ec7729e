//! Shared loader types for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use hatchery_plugins::Loader;
use hatchery_test::MockLoader;

/// Tag for the `.jar` loader type.
pub struct Jar;
/// Tag for the script loader type.
pub struct Script;
/// Tag for an archive loader that claims both `gz` and `tar.gz`.
pub struct Archive;

pub type JarLoader = MockLoader<Jar>;
pub type ScriptLoader = MockLoader<Script>;
pub type ArchiveLoader = MockLoader<Archive>;

/// Whether two handles point at the same loader instance.
pub fn same_loader(a: &Arc<dyn Loader>, b: &Arc<dyn Loader>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
