//! Tags belonging to currently open pull requests.

use std::collections::HashSet;

use crate::api::RegistryApi;
use crate::error::Result;
use crate::fetcher::PAGE_SIZE;
use crate::version::PullRequest;

/// Prefix of tags produced for pull request builds.
pub const PR_TAG_PREFIX: &str = "pr-";

/// Set of tags (`<prefix><number>`) whose pull request is still open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveTagSet {
    tags: HashSet<String>,
}

impl LiveTagSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from open pull requests, tagging each as
    /// `<prefix><number>`.
    pub fn from_pull_requests<'a>(
        prefix: &str,
        pulls: impl IntoIterator<Item = &'a PullRequest>,
    ) -> Self {
        Self::from_numbers(prefix, pulls.into_iter().map(|pr| pr.number))
    }

    /// Builds the set from pull request numbers, tagging each as
    /// `<prefix><number>`.
    pub fn from_numbers(prefix: &str, numbers: impl IntoIterator<Item = u64>) -> Self {
        Self {
            tags: numbers
                .into_iter()
                .map(|number| Self::tag_for(prefix, number))
                .collect(),
        }
    }

    /// Returns the tag a pull request build carries.
    #[must_use]
    pub fn tag_for(prefix: &str, number: u64) -> String {
        format!("{prefix}{number}")
    }

    /// Returns true if the tag belongs to an open pull request.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Number of live tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if no pull request is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Fetches open pull requests for a repository and builds the live tag set.
///
/// Only the first page is read; pull requests beyond it are not considered
/// live. Tags are built as `<prefix><number>`.
///
/// # Errors
///
/// Returns [`crate::Error::Fetch`] if the listing fails or cannot be decoded.
pub async fn fetch_live_tag_set<A>(
    api: &A,
    repo_full_name: &str,
    prefix: &str,
) -> Result<LiveTagSet>
where
    A: RegistryApi + ?Sized,
{
    let pulls = api
        .list_open_pull_requests(repo_full_name, PAGE_SIZE)
        .await
        .into_payload("pull requests")?;

    let live = LiveTagSet::from_pull_requests(prefix, &pulls);
    tracing::debug!(repository = repo_full_name, open = live.len(), "built live tag set");
    Ok(live)
}
