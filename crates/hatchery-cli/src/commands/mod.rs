//! CLI commands.

pub(crate) mod config;
pub(crate) mod loaders;
pub(crate) mod scan;
