//! In-memory registry with operation tracing.
//!
//! Holds a single package, the repository it is linked to and that
//! repository's open pull requests. Every call is recorded for assertions and
//! failures can be injected per page, per listing or per version.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sweep_core::api::{ApiResult, RegistryApi};
use sweep_core::package::PackageRef;
use sweep_core::version::{PackageInfo, PullRequest, RepositoryInfo, VersionRecord};

/// Record of a registry call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryOp {
    /// Package metadata lookup.
    GetPackage {
        /// Package that was looked up.
        package: String,
    },
    /// Version listing page.
    ListVersions {
        /// Page number requested.
        page: u32,
        /// Page size requested.
        per_page: u32,
    },
    /// Open pull request listing.
    ListPullRequests {
        /// Repository that was listed.
        repository: String,
        /// Page size requested.
        per_page: u32,
    },
    /// Version deletion.
    DeleteVersion {
        /// Version that was deleted.
        version_id: u64,
    },
}

#[derive(Debug, Default)]
struct RegistryState {
    versions: Vec<VersionRecord>,
    repository: Option<String>,
    open_pulls: Vec<PullRequest>,
    delete_statuses: HashMap<u64, u16>,
    malformed_pages: HashSet<u32>,
    malformed_pulls: bool,
    unavailable: bool,
    endless_pages: bool,
}

/// In-memory [`RegistryApi`] with operation tracing.
///
/// Clones share state, so a clone handed to a sweeper can be inspected
/// afterwards.
#[derive(Debug, Clone)]
pub struct MemoryRegistry {
    package: PackageRef,
    state: Arc<Mutex<RegistryState>>,
    operations: Arc<Mutex<Vec<RegistryOp>>>,
}

impl MemoryRegistry {
    /// Creates a registry holding `package`, linked to `repository`.
    pub fn new(package: PackageRef, repository: &str) -> Self {
        let state = RegistryState {
            repository: Some(repository.to_string()),
            ..RegistryState::default()
        };
        Self {
            package,
            state: Arc::new(Mutex::new(state)),
            operations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the package this registry serves.
    pub fn package(&self) -> &PackageRef {
        &self.package
    }

    /// Appends versions in listing order.
    pub fn add_versions(&self, versions: impl IntoIterator<Item = VersionRecord>) {
        self.state.lock().expect("lock").versions.extend(versions);
    }

    /// Opens pull requests on the linked repository.
    pub fn open_pull_requests(&self, numbers: impl IntoIterator<Item = u64>) {
        self.state
            .lock()
            .expect("lock")
            .open_pulls
            .extend(numbers.into_iter().map(|number| PullRequest { number }));
    }

    /// Removes the repository link from the package metadata.
    pub fn unlink_repository(&self) {
        self.state.lock().expect("lock").repository = None;
    }

    /// Makes deletion of `version_id` answer with `status` and leave the version in place.
    pub fn fail_delete(&self, version_id: u64, status: u16) {
        self.state
            .lock()
            .expect("lock")
            .delete_statuses
            .insert(version_id, status);
    }

    /// Makes the given version page return an undecodable body.
    pub fn malformed_page(&self, page: u32) {
        self.state.lock().expect("lock").malformed_pages.insert(page);
    }

    /// Makes the pull request listing return an undecodable body.
    pub fn malformed_pull_requests(&self) {
        self.state.lock().expect("lock").malformed_pulls = true;
    }

    /// Makes every call fail at the transport level.
    pub fn make_unavailable(&self) {
        self.state.lock().expect("lock").unavailable = true;
    }

    /// Makes every page past the last one repeat the last page.
    pub fn endless_pages(&self) {
        self.state.lock().expect("lock").endless_pages = true;
    }

    /// Returns all recorded operations.
    pub fn operations(&self) -> Vec<RegistryOp> {
        self.operations.lock().expect("lock").clone()
    }

    /// Returns the IDs deleted so far, in order.
    pub fn deleted_ids(&self) -> Vec<u64> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                RegistryOp::DeleteVersion { version_id } => Some(version_id),
                _ => None,
            })
            .collect()
    }

    /// Returns the IDs still present, in listing order.
    pub fn remaining_ids(&self) -> Vec<u64> {
        self.state
            .lock()
            .expect("lock")
            .versions
            .iter()
            .map(|v| v.id)
            .collect()
    }

    /// Returns true if no delete was attempted.
    pub fn nothing_deleted(&self) -> bool {
        self.deleted_ids().is_empty()
    }

    fn record(&self, op: RegistryOp) {
        self.operations.lock().expect("lock").push(op);
    }

    fn unavailable<T>(&self) -> Option<ApiResult<T>> {
        self.state
            .lock()
            .expect("lock")
            .unavailable
            .then(|| ApiResult::TransportError {
                message: "connection refused".to_string(),
            })
    }

    fn not_found<T>() -> ApiResult<T> {
        ApiResult::ParseError {
            status: 404,
            message: "not found".to_string(),
        }
    }
}

#[async_trait]
impl RegistryApi for MemoryRegistry {
    async fn get_package(&self, package: &PackageRef) -> ApiResult<PackageInfo> {
        self.record(RegistryOp::GetPackage {
            package: package.to_string(),
        });
        if let Some(failure) = self.unavailable() {
            return failure;
        }
        if *package != self.package {
            return Self::not_found();
        }

        let state = self.state.lock().expect("lock");
        ApiResult::Ok {
            status: 200,
            payload: PackageInfo {
                name: package.name().to_string(),
                repository: state
                    .repository
                    .clone()
                    .map(|full_name| RepositoryInfo { full_name }),
            },
        }
    }

    async fn list_versions(
        &self,
        package: &PackageRef,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Vec<VersionRecord>> {
        self.record(RegistryOp::ListVersions { page, per_page });
        if let Some(failure) = self.unavailable() {
            return failure;
        }
        if *package != self.package {
            return Self::not_found();
        }

        let state = self.state.lock().expect("lock");
        if state.malformed_pages.contains(&page) {
            return ApiResult::ParseError {
                status: 200,
                message: "expected value at line 1 column 1".to_string(),
            };
        }

        let per_page = per_page.max(1) as usize;
        let start = (page.saturating_sub(1) as usize).saturating_mul(per_page);
        let mut payload: Vec<_> = state
            .versions
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect();

        if payload.is_empty() && state.endless_pages {
            let last_start = state.versions.len().saturating_sub(per_page);
            payload = state.versions[last_start..].to_vec();
        }

        ApiResult::Ok {
            status: 200,
            payload,
        }
    }

    async fn list_open_pull_requests(
        &self,
        repo_full_name: &str,
        per_page: u32,
    ) -> ApiResult<Vec<PullRequest>> {
        self.record(RegistryOp::ListPullRequests {
            repository: repo_full_name.to_string(),
            per_page,
        });
        if let Some(failure) = self.unavailable() {
            return failure;
        }

        let state = self.state.lock().expect("lock");
        if state.repository.as_deref() != Some(repo_full_name) {
            return Self::not_found();
        }
        if state.malformed_pulls {
            return ApiResult::ParseError {
                status: 200,
                message: "invalid type: map, expected a sequence".to_string(),
            };
        }

        ApiResult::Ok {
            status: 200,
            payload: state
                .open_pulls
                .iter()
                .take(per_page as usize)
                .copied()
                .collect(),
        }
    }

    async fn delete_version(&self, package: &PackageRef, version_id: u64) -> ApiResult<()> {
        self.record(RegistryOp::DeleteVersion { version_id });
        if let Some(failure) = self.unavailable() {
            return failure;
        }
        if *package != self.package {
            return Self::not_found();
        }

        let mut state = self.state.lock().expect("lock");
        if let Some(status) = state.delete_statuses.get(&version_id) {
            return ApiResult::Ok {
                status: *status,
                payload: (),
            };
        }

        let before = state.versions.len();
        state.versions.retain(|v| v.id != version_id);
        if state.versions.len() == before {
            return Self::not_found();
        }

        ApiResult::Ok {
            status: 204,
            payload: (),
        }
    }
}
