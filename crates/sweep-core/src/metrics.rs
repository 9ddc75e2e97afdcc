//! Sweep metrics.
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the host
//! installs a recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Versions fetched from the registry.
pub const VERSIONS_FETCHED: &str = "sweep_versions_fetched_total";

/// Versions deleted, labelled by kind.
pub const VERSIONS_DELETED: &str = "sweep_versions_deleted_total";

/// Deletions the registry did not confirm, labelled by kind.
pub const DELETE_FAILURES: &str = "sweep_delete_failures_total";

/// Duration of a full sweep run.
pub const RUN_DURATION: &str = "sweep_run_duration_seconds";

/// Registers all sweep metric descriptions.
///
/// Call this once at application startup after installing a recorder.
pub fn register_metrics() {
    describe_counter!(VERSIONS_FETCHED, "Total package versions fetched");
    describe_counter!(VERSIONS_DELETED, "Total package versions deleted");
    describe_counter!(DELETE_FAILURES, "Total package version deletions that failed");
    describe_histogram!(RUN_DURATION, "Duration of sweep runs in seconds");
}

/// Records fetched versions.
pub fn record_versions_fetched(count: usize) {
    counter!(VERSIONS_FETCHED).increment(u64::try_from(count).unwrap_or(u64::MAX));
}

/// Records a confirmed deletion.
pub fn record_version_deleted(kind: &'static str) {
    counter!(VERSIONS_DELETED, "kind" => kind).increment(1);
}

/// Records a failed deletion.
pub fn record_delete_failure(kind: &'static str) {
    counter!(DELETE_FAILURES, "kind" => kind).increment(1);
}

/// Records a completed run.
pub fn record_run_duration(dry_run: bool, duration_secs: f64) {
    histogram!(RUN_DURATION, "dry_run" => if dry_run { "true" } else { "false" })
        .record(duration_secs);
}
