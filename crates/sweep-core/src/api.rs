//! Registry API abstraction.
//!
//! The policy engine never talks HTTP directly. It calls a [`RegistryApi`]
//! implementation, which reports every response as an [`ApiResult`] so that a
//! valid empty page can be told apart from a malformed or failed response.

use std::fmt;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::package::PackageRef;
use crate::version::{PackageInfo, PullRequest, VersionRecord};

/// Status code the registry returns for a successful deletion.
pub const STATUS_NO_CONTENT: u16 = 204;

/// HTTP methods the engine issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read a resource.
    Get,
    /// Delete a resource.
    Delete,
}

impl Method {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResult<T> {
    /// The request completed and the body decoded.
    Ok {
        /// HTTP status code.
        status: u16,
        /// Decoded body.
        payload: T,
    },
    /// The request completed but the body could not be decoded.
    ParseError {
        /// HTTP status code.
        status: u16,
        /// Decoder message.
        message: String,
    },
    /// The request never produced a response.
    TransportError {
        /// Transport failure description.
        message: String,
    },
}

impl<T> ApiResult<T> {
    /// Returns the status code, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Ok { status, .. } | Self::ParseError { status, .. } => Some(*status),
            Self::TransportError { .. } => None,
        }
    }

    /// Returns true if a response arrived with a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status().is_some_and(|s| (200..300).contains(&s))
    }

    /// Maps the payload, preserving the status and failure variants.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            Self::Ok { status, payload } => ApiResult::Ok {
                status,
                payload: f(payload),
            },
            Self::ParseError { status, message } => ApiResult::ParseError { status, message },
            Self::TransportError { message } => ApiResult::TransportError { message },
        }
    }

    /// Extracts the payload of a successful response.
    ///
    /// `what` names the resource for the error message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] on a parse or transport failure, or when the
    /// status is not 2xx.
    pub fn into_payload(self, what: &str) -> Result<T> {
        match self {
            Self::Ok { status, payload } if (200..300).contains(&status) => Ok(payload),
            Self::Ok { status, .. } => Err(Error::fetch(format!(
                "failed to fetch {what}: unexpected status {status}"
            ))),
            Self::ParseError { status, message } => Err(Error::fetch(format!(
                "failed to fetch {what}: malformed response (status={status}): {message}"
            ))),
            Self::TransportError { message } => Err(Error::fetch(format!(
                "failed to fetch {what}: {message}"
            ))),
        }
    }
}

/// The registry operations the policy engine needs.
///
/// Implementations must not retry; every call maps to exactly one request.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Reads package metadata.
    async fn get_package(&self, package: &PackageRef) -> ApiResult<PackageInfo>;

    /// Reads one page of the version listing. Pages start at 1.
    async fn list_versions(
        &self,
        package: &PackageRef,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Vec<VersionRecord>>;

    /// Reads the first page of open pull requests for a repository.
    async fn list_open_pull_requests(
        &self,
        repo_full_name: &str,
        per_page: u32,
    ) -> ApiResult<Vec<PullRequest>>;

    /// Deletes a version. Only the status code is meaningful.
    async fn delete_version(&self, package: &PackageRef, version_id: u64) -> ApiResult<()>;
}
