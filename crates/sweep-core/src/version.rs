//! Registry records consumed by the retention policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One published version of a container package.
///
/// Decoded from the registry's wire shape, where tags are nested under
/// `metadata.container.tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireVersion", into = "WireVersion")]
pub struct VersionRecord {
    /// Registry-assigned version ID.
    pub id: u64,
    /// Manifest digest (e.g. `sha256:...`), when the registry reports one.
    pub name: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Tags attached to this version, in registry order.
    pub tags: Vec<String>,
}

impl VersionRecord {
    /// Returns true if the version carries at least one tag.
    #[must_use]
    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireVersion {
    id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    metadata: WireMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    container: WireContainer,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireContainer {
    #[serde(default)]
    tags: Vec<String>,
}

impl From<WireVersion> for VersionRecord {
    fn from(wire: WireVersion) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            created_at: wire.created_at,
            tags: wire.metadata.container.tags,
        }
    }
}

impl From<VersionRecord> for WireVersion {
    fn from(record: VersionRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            created_at: record.created_at,
            metadata: WireMetadata {
                container: WireContainer { tags: record.tags },
            },
        }
    }
}

/// An open pull request. Only the number is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
}

/// Package metadata, used to find the repository that owns the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package name.
    pub name: String,
    /// Linked source repository, absent for unlinked packages.
    #[serde(default)]
    pub repository: Option<RepositoryInfo>,
}

/// Repository linked to a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Full repository name (`owner/name`).
    pub full_name: String,
}
