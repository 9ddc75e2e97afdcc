//! Tests for the HTTP client against a mock registry server.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use sweep_cli::Config;
use sweep_cli::client::{ACCEPT_MEDIA_TYPE, API_VERSION, ApiClient};
use sweep_core::api::{ApiResult, RegistryApi};
use sweep_core::error::Error;
use sweep_core::sweeper::{SweepOptions, Sweeper};
use sweep_test_utils::{MemoryRegistry, MockRegistryServer, VersionFactory, init_test_logging};

async fn server() -> MockRegistryServer {
    init_test_logging();
    let registry = MemoryRegistry::new(VersionFactory::package(), "acme/api");
    MockRegistryServer::start(registry).await
}

fn client(server: &MockRegistryServer, token: Option<&str>) -> ApiClient {
    let config = Config {
        api_url: server.base_url().to_string(),
        api_token: token.map(String::from),
        ..Config::default()
    };
    ApiClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_requests_carry_api_headers() {
    let server = server().await;
    let client = client(&server, Some("secret-token"));

    let result = client.get_package(&VersionFactory::package()).await;
    assert!(result.is_success());

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.uri, "/orgs/acme/packages/container/api");
    assert_eq!(request.header("authorization"), Some("Bearer secret-token"));
    assert_eq!(request.header("accept"), Some(ACCEPT_MEDIA_TYPE));
    assert_eq!(request.header("x-github-api-version"), Some(API_VERSION));
    assert!(request.header("user-agent").unwrap().starts_with("sweep/"));
}

#[tokio::test]
async fn test_no_token_sends_no_authorization() {
    let server = server().await;
    let client = client(&server, None);

    let _ = client.get_package(&VersionFactory::package()).await;

    assert!(server.requests()[0].header("authorization").is_none());
}

#[tokio::test]
async fn test_get_package_decodes_repository() {
    let server = server().await;
    let client = client(&server, None);

    let info = client
        .get_package(&VersionFactory::package())
        .await
        .into_payload("package metadata")
        .unwrap();

    assert_eq!(info.name, "api");
    assert_eq!(info.repository.unwrap().full_name, "acme/api");
}

#[tokio::test]
async fn test_list_versions_uses_page_query() {
    let server = server().await;
    server
        .registry()
        .add_versions([VersionFactory::tagged(1, 0, &["pr-3", "sha-abc"])]);
    let client = client(&server, None);

    let versions = client
        .list_versions(&VersionFactory::package(), 1, 100)
        .await
        .into_payload("versions")
        .unwrap();

    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].tags, vec!["pr-3", "sha-abc"]);
    assert_eq!(
        server.requests()[0].uri,
        "/orgs/acme/packages/container/api/versions?per_page=100&page=1"
    );
}

#[tokio::test]
async fn test_user_package_paths() {
    init_test_logging();
    let package = VersionFactory::user_package("octocat", "app");
    let registry = MemoryRegistry::new(package.clone(), "octocat/app");
    registry.add_versions(VersionFactory::untagged_series(0, 2));
    let server = MockRegistryServer::start(registry).await;
    let client = client(&server, None);

    let versions = client
        .list_versions(&package, 1, 100)
        .await
        .into_payload("versions")
        .unwrap();

    assert_eq!(versions.len(), 2);
    assert!(
        server.requests()[0]
            .uri
            .starts_with("/users/octocat/packages/container/app/versions")
    );
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = server().await;
    server.registry().malformed_page(1);
    let client = client(&server, None);

    let result = client.list_versions(&VersionFactory::package(), 1, 100).await;

    assert!(matches!(result, ApiResult::ParseError { status: 200, .. }));
    assert!(matches!(
        result.into_payload("versions"),
        Err(Error::Fetch { .. })
    ));
}

#[tokio::test]
async fn test_unknown_package_is_not_success() {
    let server = server().await;
    let client = client(&server, None);

    let result = client
        .list_versions(&VersionFactory::user_package("someone", "else"), 1, 100)
        .await;

    assert_eq!(result.status(), Some(404));
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_open_pull_requests_query() {
    let server = server().await;
    server.registry().open_pull_requests([4, 8]);
    let client = client(&server, None);

    let pulls = client
        .list_open_pull_requests("acme/api", 100)
        .await
        .into_payload("pull requests")
        .unwrap();

    assert_eq!(pulls.iter().map(|p| p.number).collect::<Vec<_>>(), vec![4, 8]);
    assert_eq!(
        server.requests()[0].uri,
        "/repos/acme/api/pulls?per_page=100&state=open"
    );
}

#[tokio::test]
async fn test_delete_version_reports_status() {
    let server = server().await;
    server.registry().add_versions(VersionFactory::untagged_series(0, 2));
    server.registry().fail_delete(1, 500);
    let client = client(&server, None);
    let package = VersionFactory::package();

    assert_eq!(client.delete_version(&package, 0).await.status(), Some(204));
    assert_eq!(client.delete_version(&package, 1).await.status(), Some(500));
    assert_eq!(server.registry().remaining_ids(), vec![1]);

    let request = &server.requests()[0];
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.uri, "/orgs/acme/packages/container/api/versions/0");
}

#[tokio::test]
async fn test_sweep_over_http() {
    let server = server().await;
    server.registry().open_pull_requests([2]);
    server.registry().add_versions(VersionFactory::untagged_series(0, 7));
    server.registry().add_versions([
        VersionFactory::tagged(10, 0, &["pr-1"]),
        VersionFactory::tagged(11, 0, &["pr-2"]),
        VersionFactory::tagged(12, 0, &["latest"]),
    ]);

    let sweeper = Sweeper::new(
        client(&server, Some("t")),
        VersionFactory::package(),
        SweepOptions::default(),
    )
    .unwrap();
    let report = sweeper.run().await.unwrap();

    assert_eq!(report.repository, "acme/api");
    assert_eq!(report.versions_fetched, 10);
    assert_eq!(report.deletions.deleted(), 2);
    assert_eq!(server.registry().deleted_ids(), vec![10, 5]);
    assert_eq!(server.registry().remaining_ids(), vec![0, 1, 2, 3, 4, 6, 11, 12]);
}

#[tokio::test]
async fn test_sweep_over_http_fetch_failure_deletes_nothing() {
    let server = server().await;
    server.registry().add_versions([VersionFactory::tagged(1, 0, &["pr-1"])]);
    server.registry().malformed_pull_requests();

    let sweeper = Sweeper::new(
        client(&server, None),
        VersionFactory::package(),
        SweepOptions::default(),
    )
    .unwrap();
    let err = sweeper.run().await.unwrap_err();

    assert!(matches!(err, Error::Fetch { .. }));
    assert!(server.registry().nothing_deleted());
    assert!(server.requests().iter().all(|r| r.method == "GET"));
}
