//! Version listing pagination.

use crate::api::RegistryApi;
use crate::error::{Error, Result};
use crate::package::PackageRef;
use crate::version::VersionRecord;

/// Page size used for every listing request.
pub const PAGE_SIZE: u32 = 100;

/// Default ceiling on the number of version pages requested in one run.
pub const DEFAULT_MAX_PAGES: u32 = 1000;

/// Fetches every version of a package.
///
/// Pages are requested from 1 upward until a page comes back empty. A
/// registry that never returns an empty page is cut off after `max_pages`
/// requests.
///
/// # Errors
///
/// Returns [`Error::Fetch`] if any page fails to fetch or decode, or if
/// `max_pages` pages were returned without reaching an empty one.
pub async fn fetch_all_versions<A>(
    api: &A,
    package: &PackageRef,
    max_pages: u32,
) -> Result<Vec<VersionRecord>>
where
    A: RegistryApi + ?Sized,
{
    let mut versions = Vec::new();

    for page in 1..=max_pages {
        tracing::debug!(package = %package, page, "fetching versions page");
        let records = api
            .list_versions(package, page, PAGE_SIZE)
            .await
            .into_payload("package versions")?;

        if records.is_empty() {
            tracing::debug!(
                package = %package,
                pages = page,
                versions = versions.len(),
                "fetched all versions"
            );
            crate::metrics::record_versions_fetched(versions.len());
            return Ok(versions);
        }

        versions.extend(records);
    }

    Err(Error::fetch(format!(
        "version listing for {package} did not end after {max_pages} pages"
    )))
}
