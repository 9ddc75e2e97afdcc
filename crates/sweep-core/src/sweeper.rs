//! End-to-end sweep of a package.
//!
//! A sweep runs strictly in sequence:
//!
//! 1. Resolve the repository that owns the package
//! 2. Build the live tag set from its open pull requests
//! 3. Fetch every version of the package
//! 4. Classify versions against the retention policy
//! 5. Delete eligible tagged versions, then eligible untagged versions
//!
//! Any failure in steps 1–3 aborts the sweep before anything is deleted.

use std::time::Instant;

use serde::Serialize;
use tracing::Instrument;

use crate::api::RegistryApi;
use crate::error::{Error, Result};
use crate::executor::{DeletionExecutor, DeletionReport, VersionKind};
use crate::fetcher::{DEFAULT_MAX_PAGES, fetch_all_versions};
use crate::liveness::fetch_live_tag_set;
use crate::observability::sweep_span;
use crate::package::PackageRef;
use crate::policy::{Classification, RetainReason, RetainedVersion, RetentionPolicy, classify};

/// Settings for a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOptions {
    /// Retention policy applied to the fetched versions.
    pub policy: RetentionPolicy,
    /// Ceiling on version listing pages.
    pub max_pages: u32,
    /// Repository (`owner/name`) to read pull requests from. When unset it
    /// is looked up from the package metadata.
    pub repository: Option<String>,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            policy: RetentionPolicy::default(),
            max_pages: DEFAULT_MAX_PAGES,
            repository: None,
        }
    }
}

/// Summary of a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// Package that was swept.
    pub package: String,
    /// Repository whose pull requests were consulted.
    pub repository: String,
    /// Whether deletions were only planned.
    pub dry_run: bool,
    /// Number of versions fetched.
    pub versions_fetched: usize,
    /// Number of open pull requests seen.
    pub open_pull_requests: usize,
    /// Versions kept, with reasons.
    pub retained: Vec<RetainedVersion>,
    /// Deletion outcomes, tagged first.
    pub deletions: DeletionReport,
    /// Wall-clock duration in seconds.
    pub duration_secs: f64,
}

/// Inputs gathered for a decision and the resulting classification.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Repository whose pull requests were consulted.
    pub repository: String,
    /// Number of open pull requests seen.
    pub open_pull_requests: usize,
    /// Number of versions fetched.
    pub versions_fetched: usize,
    /// Classification of the fetched versions.
    pub classification: Classification,
}

/// Applies a retention policy to one package.
///
/// # Example
///
/// ```rust,ignore
/// let sweeper = Sweeper::new(client, package, SweepOptions::default())?;
///
/// // Dry run first
/// let plan = sweeper.plan().await?;
///
/// // Actually delete
/// let report = sweeper.run().await?;
/// ```
pub struct Sweeper<A> {
    api: A,
    package: PackageRef,
    options: SweepOptions,
}

impl<A: RegistryApi> Sweeper<A> {
    /// Creates a sweeper.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the policy is invalid or
    /// `max_pages` is zero.
    pub fn new(api: A, package: PackageRef, options: SweepOptions) -> Result<Self> {
        options.policy.validate()?;
        if options.max_pages == 0 {
            return Err(Error::configuration("max_pages must be at least 1"));
        }
        Ok(Self {
            api,
            package,
            options,
        })
    }

    /// Returns the package being swept.
    #[must_use]
    pub fn package(&self) -> &PackageRef {
        &self.package
    }

    /// Computes what would be deleted without deleting anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] if the repository, pull requests or versions
    /// cannot be fetched.
    pub async fn plan(&self) -> Result<SweepReport> {
        self.sweep(true)
            .instrument(sweep_span("plan", &self.package.to_string()))
            .await
    }

    /// Deletes every eligible version.
    ///
    /// Individual deletion failures are reported in
    /// [`SweepReport::deletions`] and do not make this call fail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] if the repository, pull requests or versions
    /// cannot be fetched. Nothing is deleted in that case.
    pub async fn run(&self) -> Result<SweepReport> {
        self.sweep(false)
            .instrument(sweep_span("prune", &self.package.to_string()))
            .await
    }

    /// Fetches everything the decision needs and classifies the versions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] if any listing fails.
    pub async fn evaluate(&self) -> Result<Evaluation> {
        let repository = self.resolve_repository().await?;
        let live = fetch_live_tag_set(
            &self.api,
            &repository,
            &self.options.policy.pr_tag_prefix,
        )
        .await?;
        let versions =
            fetch_all_versions(&self.api, &self.package, self.options.max_pages).await?;

        Ok(Evaluation {
            classification: classify(&versions, &live, &self.options.policy),
            repository,
            open_pull_requests: live.len(),
            versions_fetched: versions.len(),
        })
    }

    async fn sweep(&self, dry_run: bool) -> Result<SweepReport> {
        let start = Instant::now();

        tracing::info!(
            keep_recent_untagged = self.options.policy.keep_recent_untagged,
            pr_tag_prefix = %self.options.policy.pr_tag_prefix,
            dry_run,
            "starting sweep"
        );

        let Evaluation {
            repository,
            open_pull_requests,
            versions_fetched,
            classification,
        } = self.evaluate().await?;

        for retained in &classification.retained {
            log_retained(retained);
        }

        let executor = if dry_run {
            DeletionExecutor::dry_run(&self.api, &self.package)
        } else {
            DeletionExecutor::new(&self.api, &self.package)
        };

        let mut deletions = executor
            .delete_all(&classification.tagged_eligible, VersionKind::Tagged)
            .await;
        deletions.merge(
            executor
                .delete_all(&classification.untagged_eligible, VersionKind::Untagged)
                .await,
        );

        let duration_secs = start.elapsed().as_secs_f64();
        crate::metrics::record_run_duration(dry_run, duration_secs);

        tracing::info!(
            repository = %repository,
            versions_fetched,
            open_pull_requests,
            retained = classification.retained.len(),
            deleted = deletions.deleted(),
            planned = deletions.planned(),
            failed = deletions.failed(),
            duration_secs,
            "sweep completed"
        );

        Ok(SweepReport {
            package: self.package.to_string(),
            repository,
            dry_run,
            versions_fetched,
            open_pull_requests,
            retained: classification.retained,
            deletions,
            duration_secs,
        })
    }

    async fn resolve_repository(&self) -> Result<String> {
        if let Some(repository) = &self.options.repository {
            return Ok(repository.clone());
        }

        let info = self
            .api
            .get_package(&self.package)
            .await
            .into_payload("package metadata")?;

        info.repository.map(|r| r.full_name).ok_or_else(|| {
            Error::fetch(format!(
                "package {} is not linked to a repository",
                self.package
            ))
        })
    }
}

fn log_retained(retained: &RetainedVersion) {
    let version = &retained.version;
    match &retained.reason {
        RetainReason::NotPullRequestTag { .. } | RetainReason::OpenPullRequest { .. } => {
            tracing::debug!(
                version_id = version.id,
                reason = %retained.reason,
                "skipping tagged version, not a pr or pr is still open"
            );
        }
        RetainReason::RecentUntagged { rank } => {
            tracing::debug!(
                version_id = version.id,
                rank,
                "skipping untagged version in the latest window"
            );
        }
        RetainReason::OldestUntagged => {
            tracing::debug!(version_id = version.id, "skipping oldest untagged version");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::executor::{DeletionOutcome, DeletionStatus};
    use crate::version::VersionRecord;

    fn assert_snake_case_keys(value: &Value, path: &str) {
        match value {
            Value::Object(map) => {
                for (key, nested) in map {
                    assert!(
                        !key.chars().any(char::is_uppercase),
                        "key {path}.{key} is not snake_case"
                    );
                    assert_snake_case_keys(nested, &format!("{path}.{key}"));
                }
            }
            Value::Array(items) => {
                for item in items {
                    assert_snake_case_keys(item, path);
                }
            }
            _ => {}
        }
    }

    #[test]
    fn test_report_json_uses_snake_case_throughout() {
        let version = VersionRecord {
            id: 2,
            name: Some("sha256:abc".to_string()),
            created_at: chrono::Utc::now(),
            tags: vec!["latest".to_string()],
        };
        let report = SweepReport {
            package: "org:acme/api".to_string(),
            repository: "acme/api".to_string(),
            dry_run: false,
            versions_fetched: 2,
            open_pull_requests: 0,
            retained: vec![RetainedVersion {
                version,
                reason: RetainReason::NotPullRequestTag {
                    tag: "latest".to_string(),
                },
            }],
            deletions: DeletionReport {
                outcomes: vec![DeletionOutcome {
                    version_id: 1,
                    kind: VersionKind::Tagged,
                    tags: vec!["pr-3".to_string()],
                    status: DeletionStatus::Failed {
                        status_code: Some(403),
                        message: "unexpected status 403".to_string(),
                    },
                }],
            },
            duration_secs: 0.1,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_snake_case_keys(&json, "report");
        assert_eq!(json["dry_run"], false);
        assert_eq!(json["versions_fetched"], 2);
        assert_eq!(json["deletions"]["outcomes"][0]["status_code"], 403);
        assert!(json["retained"][0]["version"]["created_at"].is_string());
    }

    #[test]
    fn test_default_options() {
        let options = SweepOptions::default();
        assert_eq!(options.max_pages, DEFAULT_MAX_PAGES);
        assert!(options.repository.is_none());
        assert_eq!(options.policy, RetentionPolicy::default());
    }
}
