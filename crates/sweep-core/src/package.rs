//! Package addressing.
//!
//! A package is owned either by a user or by an organization. Exactly one
//! owner scope must be given; this is validated before anything touches the
//! network.

use std::fmt;

use crate::error::{Error, Result};

/// The account that owns a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerScope {
    /// A personal account (`/users/{name}`).
    User(String),
    /// An organization (`/orgs/{name}`).
    Org(String),
}

impl OwnerScope {
    /// Builds an owner scope from the optional user and org inputs.
    ///
    /// Empty strings count as absent, matching how unset action inputs
    /// arrive from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if both or neither are provided.
    pub fn from_parts(user: Option<&str>, org: Option<&str>) -> Result<Self> {
        let user = user.map(str::trim).filter(|s| !s.is_empty());
        let org = org.map(str::trim).filter(|s| !s.is_empty());

        match (user, org) {
            (Some(_), Some(_)) => Err(Error::configuration(
                "only one of user or org can be specified",
            )),
            (None, None) => Err(Error::configuration(
                "one of user or org must be specified",
            )),
            (Some(user), None) => Ok(Self::User(user.to_string())),
            (None, Some(org)) => Ok(Self::Org(org.to_string())),
        }
    }

    /// Returns the API path prefix for this owner (e.g. `users/octocat`).
    #[must_use]
    pub fn path_prefix(&self) -> String {
        match self {
            Self::User(name) => format!("users/{name}"),
            Self::Org(name) => format!("orgs/{name}"),
        }
    }

    /// Returns the owner's account name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::User(name) | Self::Org(name) => name,
        }
    }
}

impl fmt::Display for OwnerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(name) => write!(f, "user:{name}"),
            Self::Org(name) => write!(f, "org:{name}"),
        }
    }
}

/// A container package in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    owner: OwnerScope,
    name: String,
}

impl PackageRef {
    /// Creates a package reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the package name is empty.
    pub fn new(owner: OwnerScope, name: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::configuration("package name is required"));
        }
        Ok(Self { owner, name })
    }

    /// Returns the owner scope.
    #[must_use]
    pub fn owner(&self) -> &OwnerScope {
        &self.owner
    }

    /// Returns the package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the package metadata endpoint.
    #[must_use]
    pub fn package_path(&self) -> String {
        format!(
            "/{}/packages/container/{}",
            self.owner.path_prefix(),
            self.name
        )
    }

    /// Path of one page of the version listing.
    #[must_use]
    pub fn versions_path(&self, page: u32, per_page: u32) -> String {
        format!(
            "{}/versions?per_page={per_page}&page={page}",
            self.package_path()
        )
    }

    /// Path of a single version, used for deletion.
    #[must_use]
    pub fn version_path(&self, version_id: u64) -> String {
        format!("{}/versions/{version_id}", self.package_path())
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Path of the open pull request listing for a repository (`owner/name`).
#[must_use]
pub fn open_pull_requests_path(repo_full_name: &str, per_page: u32) -> String {
    format!("/repos/{repo_full_name}/pulls?per_page={per_page}&state=open")
}
