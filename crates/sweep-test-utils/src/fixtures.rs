//! Factory functions for version fixtures.

use chrono::{DateTime, Duration, TimeZone, Utc};

use sweep_core::package::{OwnerScope, PackageRef};
use sweep_core::version::VersionRecord;

/// Builds package and version fixtures.
///
/// Timestamps are derived from a fixed epoch so tests are deterministic.
pub struct VersionFactory;

impl VersionFactory {
    /// Fixed reference instant; fixtures are created relative to it.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    /// The default test package (`org:acme/api`).
    pub fn package() -> PackageRef {
        PackageRef::new(OwnerScope::Org("acme".to_string()), "api").unwrap()
    }

    /// A package owned by a user.
    pub fn user_package(user: &str, name: &str) -> PackageRef {
        PackageRef::new(OwnerScope::User(user.to_string()), name).unwrap()
    }

    /// A tagged version created `age_hours` before [`Self::epoch`].
    pub fn tagged(id: u64, age_hours: i64, tags: &[&str]) -> VersionRecord {
        VersionRecord {
            id,
            name: Some(format!("sha256:{id:064x}")),
            created_at: Self::epoch() - Duration::hours(age_hours),
            tags: tags.iter().map(ToString::to_string).collect(),
        }
    }

    /// An untagged version created `age_hours` before [`Self::epoch`].
    pub fn untagged(id: u64, age_hours: i64) -> VersionRecord {
        Self::tagged(id, age_hours, &[])
    }

    /// `count` untagged versions, newest first, with IDs `start..start + count`.
    ///
    /// Version `start + i` is `i` hours old.
    pub fn untagged_series(start: u64, count: u64) -> Vec<VersionRecord> {
        (0..count)
            .map(|i| Self::untagged(start + i, i64::try_from(i).unwrap()))
            .collect()
    }
}
