//! Shared test utilities for Hatchery crates.
//!
//! Use as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! hatchery-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use hatchery_test::{MockLoaderBuilder, PluginDirFixture};
//!
//! #[test]
//! fn loads_matching_files() {
//!     let fixture = PluginDirFixture::new();
//!     fixture.add_file("a.foo", "");
//!     let manager = fixture.manager();
//!     let builder = MockLoaderBuilder::new(&["foo"]);
//!     let log = builder.log();
//!     assert!(manager.register_loader_with(builder.factory::<()>(), false));
//!     manager.load_plugins(&fixture.plugins_dir()).unwrap();
//!     assert_eq!(log.len(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
