//! # sweep-core
//!
//! Retention policy engine for container registry package versions.
//!
//! Given a package's version history and the open pull requests of the
//! repository that owns it, decides which versions are safe to delete and
//! issues the deletions:
//!
//! - **Fetching**: pages through the version listing and reads open pull
//!   requests through the [`api::RegistryApi`] trait
//! - **Policy**: tagged versions are deletable once every tag is a closed
//!   pull request tag; untagged versions outside the retention window are
//!   deletable
//! - **Execution**: deletions are issued one by one and failures are recorded
//!   without stopping the run
//!
//! ## Example
//!
//! ```rust
//! use sweep_core::prelude::*;
//!
//! let live = LiveTagSet::from_numbers("pr-", [7]);
//! let versions = vec![VersionRecord {
//!     id: 1,
//!     name: None,
//!     created_at: chrono::Utc::now(),
//!     tags: vec!["pr-9".to_string()],
//! }];
//!
//! let result = classify(&versions, &live, &RetentionPolicy::default());
//! assert_eq!(result.tagged_eligible.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod api;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod liveness;
pub mod metrics;
pub mod observability;
pub mod package;
pub mod policy;
pub mod sweeper;
pub mod version;

pub use error::{Error, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::api::{ApiResult, Method, RegistryApi};
    pub use crate::error::{Error, Result};
    pub use crate::executor::{DeletionOutcome, DeletionReport, DeletionStatus, VersionKind};
    pub use crate::liveness::LiveTagSet;
    pub use crate::package::{OwnerScope, PackageRef};
    pub use crate::policy::{Classification, RetainReason, RetentionPolicy, classify};
    pub use crate::sweeper::{SweepOptions, SweepReport, Sweeper};
    pub use crate::version::{PackageInfo, PullRequest, VersionRecord};
}
