//! Retention policy and version classification.
//!
//! Classification is a pure function of the fetched versions, the live tag
//! set and the policy. Versions are split into two groups:
//!
//! - **Tagged**: deletable only when every tag is a pull request tag whose
//!   pull request is no longer open. Any other tag protects the version.
//! - **Untagged**: ordered newest first. The most recent
//!   [`RetentionPolicy::keep_recent_untagged`] versions and the single oldest
//!   version are kept; everything in between is deletable.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::liveness::{LiveTagSet, PR_TAG_PREFIX};
use crate::version::VersionRecord;

/// Default number of most recent untagged versions to keep.
pub const DEFAULT_KEEP_RECENT_UNTAGGED: usize = 5;

/// Retention policy for package versions.
///
/// # Example
///
/// ```rust
/// use sweep_core::policy::RetentionPolicy;
///
/// let policy = RetentionPolicy::default();
/// assert_eq!(policy.keep_recent_untagged, 5);
/// assert_eq!(policy.pr_tag_prefix, "pr-");
///
/// let policy = RetentionPolicy::with_keep_recent_untagged(10);
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Number of most recent untagged versions that are always kept.
    pub keep_recent_untagged: usize,

    /// Prefix identifying tags produced for pull request builds.
    pub pr_tag_prefix: String,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_recent_untagged: DEFAULT_KEEP_RECENT_UNTAGGED,
            pr_tag_prefix: PR_TAG_PREFIX.to_string(),
        }
    }
}

impl RetentionPolicy {
    /// Creates the default policy with a different untagged window.
    #[must_use]
    pub fn with_keep_recent_untagged(keep_recent_untagged: usize) -> Self {
        Self {
            keep_recent_untagged,
            ..Self::default()
        }
    }

    /// Validates the policy settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the pull request tag prefix is
    /// empty, which would make every tag look like a pull request tag.
    pub fn validate(&self) -> Result<()> {
        if self.pr_tag_prefix.is_empty() {
            return Err(Error::configuration("pr_tag_prefix must not be empty"));
        }
        Ok(())
    }

    /// Decides whether a tagged version may be deleted.
    ///
    /// Returns `None` when every tag is a pull request tag and none of them
    /// is live, otherwise the reason the version is kept. Tags are checked in
    /// order and the first protecting tag is reported.
    #[must_use]
    pub fn tagged_retain_reason(
        &self,
        tags: &[String],
        live: &LiveTagSet,
    ) -> Option<RetainReason> {
        tags.iter().find_map(|tag| {
            if !tag.starts_with(&self.pr_tag_prefix) {
                Some(RetainReason::NotPullRequestTag { tag: tag.clone() })
            } else if live.contains(tag) {
                Some(RetainReason::OpenPullRequest { tag: tag.clone() })
            } else {
                None
            }
        })
    }

    /// Returns true if a tagged version may be deleted.
    #[must_use]
    pub fn is_tagged_eligible(&self, version: &VersionRecord, live: &LiveTagSet) -> bool {
        version.is_tagged() && self.tagged_retain_reason(&version.tags, live).is_none()
    }
}

/// Returns the range of deletable positions in a newest-first sequence of
/// `len` untagged versions.
///
/// Positions `0..keep_recent` and the last position are excluded, so the
/// range is `keep_recent..len - 1`, empty when `len <= keep_recent + 1`.
///
/// ```rust
/// use sweep_core::policy::untagged_deletion_window;
///
/// assert_eq!(untagged_deletion_window(8, 5), 5..7);
/// assert!(untagged_deletion_window(6, 5).is_empty());
/// assert!(untagged_deletion_window(0, 5).is_empty());
/// ```
#[must_use]
pub fn untagged_deletion_window(len: usize, keep_recent: usize) -> Range<usize> {
    let end = len.saturating_sub(1);
    keep_recent.min(end)..end
}

/// Why a version is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RetainReason {
    /// A tag does not follow the pull request naming convention.
    NotPullRequestTag {
        /// The protecting tag.
        tag: String,
    },
    /// A tag belongs to a pull request that is still open.
    OpenPullRequest {
        /// The protecting tag.
        tag: String,
    },
    /// Among the most recent untagged versions.
    RecentUntagged {
        /// Position in newest-first order.
        rank: usize,
    },
    /// The oldest untagged version.
    OldestUntagged,
}

impl fmt::Display for RetainReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPullRequestTag { tag } => write!(f, "tag {tag} is not a pr tag"),
            Self::OpenPullRequest { tag } => write!(f, "pr for tag {tag} is still open"),
            Self::RecentUntagged { rank } => write!(f, "untagged rank {rank} is in the latest window"),
            Self::OldestUntagged => f.write_str("oldest untagged version"),
        }
    }
}

/// A version the policy keeps, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetainedVersion {
    /// The kept version.
    pub version: VersionRecord,
    /// Why it is kept.
    pub reason: RetainReason,
}

/// Result of classifying a package's versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Tagged versions whose tags are all closed pull request tags, in fetch order.
    pub tagged_eligible: Vec<VersionRecord>,
    /// Untagged versions outside the retention window, newest first.
    pub untagged_eligible: Vec<VersionRecord>,
    /// Every version that is kept.
    pub retained: Vec<RetainedVersion>,
}

impl Classification {
    /// Total number of versions eligible for deletion.
    #[must_use]
    pub fn eligible_count(&self) -> usize {
        self.tagged_eligible.len() + self.untagged_eligible.len()
    }
}

/// Classifies versions into deletable and retained sets.
///
/// Untagged versions are ordered by creation time, newest first; versions
/// created at the same instant keep their fetch order.
#[must_use]
pub fn classify(
    versions: &[VersionRecord],
    live: &LiveTagSet,
    policy: &RetentionPolicy,
) -> Classification {
    let mut classification = Classification::default();
    let mut untagged = Vec::new();

    for version in versions {
        if !version.is_tagged() {
            untagged.push(version);
            continue;
        }

        match policy.tagged_retain_reason(&version.tags, live) {
            None => classification.tagged_eligible.push(version.clone()),
            Some(reason) => classification.retained.push(RetainedVersion {
                version: version.clone(),
                reason,
            }),
        }
    }

    untagged.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let window = untagged_deletion_window(untagged.len(), policy.keep_recent_untagged);
    for (rank, version) in untagged.into_iter().enumerate() {
        if window.contains(&rank) {
            classification.untagged_eligible.push(version.clone());
            continue;
        }

        let reason = if rank < window.start {
            RetainReason::RecentUntagged { rank }
        } else {
            RetainReason::OldestUntagged
        };
        classification.retained.push(RetainedVersion {
            version: version.clone(),
            reason,
        });
    }

    classification
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn tagged(id: u64, tags: &[&str]) -> VersionRecord {
        VersionRecord {
            id,
            name: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            tags: tags.iter().map(ToString::to_string).collect(),
        }
    }

    /// Untagged version created `age_hours` before a fixed instant.
    fn untagged(id: u64, age_hours: i64) -> VersionRecord {
        VersionRecord {
            id,
            name: None,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
                - Duration::hours(age_hours),
            tags: Vec::new(),
        }
    }

    fn ids(versions: &[VersionRecord]) -> Vec<u64> {
        versions.iter().map(|v| v.id).collect()
    }

    #[test]
    fn test_default_policy() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.keep_recent_untagged, 5);
        assert_eq!(policy.pr_tag_prefix, "pr-");
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_prefix() {
        let policy = RetentionPolicy {
            pr_tag_prefix: String::new(),
            ..Default::default()
        };
        assert!(policy.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_tag_of_open_pr_is_retained() {
        let live = LiveTagSet::from_numbers(PR_TAG_PREFIX, [7]);
        let result = classify(&[tagged(1, &["pr-7"])], &live, &RetentionPolicy::default());

        assert!(result.tagged_eligible.is_empty());
        assert_eq!(
            result.retained[0].reason,
            RetainReason::OpenPullRequest {
                tag: "pr-7".to_string()
            }
        );
    }

    #[test]
    fn test_tag_of_closed_pr_is_eligible() {
        let result = classify(
            &[tagged(1, &["pr-9"])],
            &LiveTagSet::new(),
            &RetentionPolicy::default(),
        );
        assert_eq!(ids(&result.tagged_eligible), vec![1]);
        assert!(result.retained.is_empty());
    }

    #[test]
    fn test_non_pr_tag_protects_version() {
        let result = classify(
            &[tagged(1, &["pr-9", "latest"])],
            &LiveTagSet::new(),
            &RetentionPolicy::default(),
        );
        assert!(result.tagged_eligible.is_empty());
        assert_eq!(
            result.retained[0].reason,
            RetainReason::NotPullRequestTag {
                tag: "latest".to_string()
            }
        );
    }

    #[test]
    fn test_one_live_tag_among_closed_tags_protects_version() {
        let live = LiveTagSet::from_numbers(PR_TAG_PREFIX, [4]);
        let policy = RetentionPolicy::default();
        let version = tagged(1, &["pr-2", "pr-3", "pr-4"]);
        assert!(!policy.is_tagged_eligible(&version, &live));
    }

    #[test]
    fn test_eight_untagged_versions() {
        // Created newest first: id 0 is the newest, id 7 the oldest.
        let versions: Vec<_> = (0..8).map(|i| untagged(i, i as i64)).collect();
        let result = classify(&versions, &LiveTagSet::new(), &RetentionPolicy::default());

        assert_eq!(ids(&result.untagged_eligible), vec![5, 6]);
        let oldest = result.retained.iter().find(|r| r.version.id == 7).unwrap();
        assert_eq!(oldest.reason, RetainReason::OldestUntagged);
        let recent = result.retained.iter().find(|r| r.version.id == 4).unwrap();
        assert_eq!(recent.reason, RetainReason::RecentUntagged { rank: 4 });
    }

    #[test]
    fn test_untagged_sorted_by_creation_not_fetch_order() {
        // Fetched oldest first.
        let versions: Vec<_> = (0..9).map(|i| untagged(i, 100 - i as i64)).collect();
        let result = classify(&versions, &LiveTagSet::new(), &RetentionPolicy::default());

        // Newest first: 8,7,6,5,4 kept, 3,2,1 deletable, 0 kept as oldest.
        assert_eq!(ids(&result.untagged_eligible), vec![3, 2, 1]);
    }

    #[test]
    fn test_six_or_fewer_untagged_yields_nothing() {
        for len in 0..=6 {
            let versions: Vec<_> = (0..len).map(|i| untagged(i, i as i64)).collect();
            let result = classify(&versions, &LiveTagSet::new(), &RetentionPolicy::default());
            assert!(result.untagged_eligible.is_empty(), "len {len}");
            assert_eq!(result.retained.len(), len as usize);
        }
    }

    #[test]
    fn test_ties_keep_fetch_order() {
        let versions: Vec<_> = (0..8).map(|i| untagged(i, 0)).collect();
        let result = classify(&versions, &LiveTagSet::new(), &RetentionPolicy::default());
        assert_eq!(ids(&result.untagged_eligible), vec![5, 6]);
    }

    #[test]
    fn test_mixed_versions_are_disjoint() {
        let mut versions: Vec<_> = (0..7).map(|i| untagged(i, i as i64)).collect();
        versions.push(tagged(100, &["pr-1"]));
        versions.push(tagged(101, &["main"]));

        let result = classify(&versions, &LiveTagSet::new(), &RetentionPolicy::default());
        assert_eq!(ids(&result.tagged_eligible), vec![100]);
        assert_eq!(ids(&result.untagged_eligible), vec![5]);
        assert_eq!(result.eligible_count() + result.retained.len(), versions.len());
    }

    #[test]
    fn test_custom_window() {
        let versions: Vec<_> = (0..4).map(|i| untagged(i, i as i64)).collect();
        let policy = RetentionPolicy::with_keep_recent_untagged(1);
        let result = classify(&versions, &LiveTagSet::new(), &policy);
        assert_eq!(ids(&result.untagged_eligible), vec![1, 2]);
    }

    #[test]
    fn test_deletion_window_bounds() {
        assert_eq!(untagged_deletion_window(0, 5), 0..0);
        assert_eq!(untagged_deletion_window(1, 5), 0..0);
        assert!(untagged_deletion_window(6, 5).is_empty());
        assert_eq!(untagged_deletion_window(7, 5), 5..6);
        assert_eq!(untagged_deletion_window(8, 5), 5..7);
        assert_eq!(untagged_deletion_window(3, 0), 0..2);
    }

    #[test]
    fn test_retain_reason_serializes_tagged() {
        let json = serde_json::to_value(RetainReason::RecentUntagged { rank: 2 }).unwrap();
        assert_eq!(json["reason"], "recent_untagged");
        assert_eq!(json["rank"], 2);
    }
}
