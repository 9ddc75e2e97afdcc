//! Shared test utilities for sweep.
//!
//! This crate provides:
//! - [`MemoryRegistry`]: In-memory registry with operation recording and
//!   failure injection
//! - [`MockRegistryServer`]: HTTP server that serves a [`MemoryRegistry`]
//!   over the registry's REST paths
//! - [`VersionFactory`]: Builders for version fixtures
//!
//! # Example
//!
//! ```rust,ignore
//! use sweep_test_utils::{MemoryRegistry, VersionFactory};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let registry = MemoryRegistry::new(VersionFactory::package(), "acme/api");
//!     registry.add_versions(VersionFactory::untagged_series(0, 8));
//!     // ... run sweeper ...
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod fixtures;
pub mod http_server;
pub mod registry;

pub use fixtures::*;
pub use http_server::*;
pub use registry::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("sweep_core=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
