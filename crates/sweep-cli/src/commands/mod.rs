//! CLI command implementations.

pub mod plan;
pub mod prune;
pub mod report;

use clap::Args;

use sweep_core::fetcher::DEFAULT_MAX_PAGES;
use sweep_core::liveness::PR_TAG_PREFIX;
use sweep_core::package::{OwnerScope, PackageRef};
use sweep_core::policy::{DEFAULT_KEEP_RECENT_UNTAGGED, RetentionPolicy};
use sweep_core::sweeper::SweepOptions;

/// Package selection and policy arguments shared by `prune` and `plan`.
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// User that owns the package (mutually exclusive with --org).
    #[arg(long, env = "INPUT_USER")]
    pub user: Option<String>,

    /// Organization that owns the package (mutually exclusive with --user).
    #[arg(long, env = "INPUT_ORG")]
    pub org: Option<String>,

    /// Container package name.
    #[arg(long, env = "INPUT_PACKAGE")]
    pub package: Option<String>,

    /// Repository (owner/name) whose pull requests keep tags alive.
    /// Looked up from the package when omitted.
    #[arg(long)]
    pub repository: Option<String>,

    /// Number of most recent untagged versions to keep.
    #[arg(long, default_value_t = DEFAULT_KEEP_RECENT_UNTAGGED)]
    pub keep_untagged: usize,

    /// Tag prefix used for pull request builds.
    #[arg(long, default_value = PR_TAG_PREFIX)]
    pub pr_tag_prefix: String,

    /// Maximum number of version pages to read.
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: u32,
}

impl TargetArgs {
    /// Resolves the package to sweep.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if both or neither of user and org are
    /// set, or the package name is missing.
    pub fn package_ref(&self) -> sweep_core::Result<PackageRef> {
        let owner = OwnerScope::from_parts(self.user.as_deref(), self.org.as_deref())?;
        PackageRef::new(owner, self.package.clone().unwrap_or_default())
    }

    /// Builds sweep options from the policy arguments.
    #[must_use]
    pub fn sweep_options(&self) -> SweepOptions {
        SweepOptions {
            policy: RetentionPolicy {
                keep_recent_untagged: self.keep_untagged,
                pr_tag_prefix: self.pr_tag_prefix.clone(),
            },
            max_pages: self.max_pages,
            repository: self.repository.clone().filter(|r| !r.is_empty()),
        }
    }
}
