//! Sequential deletion of eligible versions.
//!
//! Deletions are issued one at a time. A failed deletion is recorded in the
//! report and logged; it never stops the remaining deletions.

use std::fmt;

use serde::Serialize;

use crate::api::{ApiResult, RegistryApi, STATUS_NO_CONTENT};
use crate::package::PackageRef;
use crate::version::VersionRecord;

/// Which policy group a version was selected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionKind {
    /// Selected by the tagged rule.
    Tagged,
    /// Selected by the untagged window.
    Untagged,
}

impl VersionKind {
    /// Returns the kind as a metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tagged => "tagged",
            Self::Untagged => "untagged",
        }
    }
}

impl fmt::Display for VersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeletionStatus {
    /// The registry confirmed the deletion.
    Deleted,
    /// Dry run: the deletion would have been issued.
    Planned,
    /// The registry did not confirm the deletion.
    Failed {
        /// Status code returned, absent on transport failure.
        status_code: Option<u16>,
        /// Failure description.
        message: String,
    },
}

/// Per-version deletion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    /// Version ID.
    pub version_id: u64,
    /// Policy group.
    pub kind: VersionKind,
    /// Tags the version carried.
    pub tags: Vec<String>,
    /// Result.
    #[serde(flatten)]
    pub status: DeletionStatus,
}

impl DeletionOutcome {
    /// Returns true if the deletion failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, DeletionStatus::Failed { .. })
    }
}

/// Outcomes of a batch of deletions, in issue order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    /// One entry per version, in the order deletions were issued.
    pub outcomes: Vec<DeletionOutcome>,
}

impl DeletionReport {
    /// Appends another report.
    pub fn merge(&mut self, other: Self) {
        self.outcomes.extend(other.outcomes);
    }

    /// Number of confirmed deletions.
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::Deleted))
    }

    /// Number of planned (dry run) deletions.
    #[must_use]
    pub fn planned(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::Planned))
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::Failed { .. }))
    }

    /// Returns true if any deletion failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&DeletionStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Issues deletions against the registry.
pub struct DeletionExecutor<'a, A: ?Sized> {
    api: &'a A,
    package: &'a PackageRef,
    dry_run: bool,
}

impl<'a, A> DeletionExecutor<'a, A>
where
    A: RegistryApi + ?Sized,
{
    /// Creates an executor that deletes versions of `package`.
    #[must_use]
    pub fn new(api: &'a A, package: &'a PackageRef) -> Self {
        Self {
            api,
            package,
            dry_run: false,
        }
    }

    /// Creates an executor that records planned deletions without issuing them.
    #[must_use]
    pub fn dry_run(api: &'a A, package: &'a PackageRef) -> Self {
        Self {
            api,
            package,
            dry_run: true,
        }
    }

    /// Deletes every version in order.
    ///
    /// Success is status 204. Anything else is recorded as a failure and the
    /// next version is processed.
    pub async fn delete_all(&self, versions: &[VersionRecord], kind: VersionKind) -> DeletionReport {
        let mut report = DeletionReport::default();

        for version in versions {
            match kind {
                VersionKind::Tagged => tracing::info!(
                    version_id = version.id,
                    tags = %version.tags.join(", "),
                    dry_run = self.dry_run,
                    "deleting tagged version, no open pr found"
                ),
                VersionKind::Untagged => tracing::info!(
                    version_id = version.id,
                    created_at = %version.created_at,
                    dry_run = self.dry_run,
                    "deleting old untagged version"
                ),
            }

            let status = if self.dry_run {
                DeletionStatus::Planned
            } else {
                self.delete_one(version.id, kind).await
            };

            report.outcomes.push(DeletionOutcome {
                version_id: version.id,
                kind,
                tags: version.tags.clone(),
                status,
            });
        }

        report
    }

    async fn delete_one(&self, version_id: u64, kind: VersionKind) -> DeletionStatus {
        let result = self.api.delete_version(self.package, version_id).await;

        let (status_code, message) = match result {
            ApiResult::Ok { status, .. } | ApiResult::ParseError { status, .. }
                if status == STATUS_NO_CONTENT =>
            {
                crate::metrics::record_version_deleted(kind.as_str());
                return DeletionStatus::Deleted;
            }
            ApiResult::Ok { status, .. } | ApiResult::ParseError { status, .. } => {
                (Some(status), format!("unexpected status {status}"))
            }
            ApiResult::TransportError { message } => (None, message),
        };

        tracing::error!(
            version_id,
            kind = %kind,
            status_code = ?status_code,
            error = %message,
            "failed to delete version"
        );
        crate::metrics::record_delete_failure(kind.as_str());

        DeletionStatus::Failed {
            status_code,
            message,
        }
    }
}
