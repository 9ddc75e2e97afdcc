//! Tests for the `sweep` command line against a mock registry server.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::process::{Command, Output};

use clap::Parser;
use sweep_cli::{Cli, Commands};
use sweep_test_utils::{MemoryRegistry, MockRegistryServer, VersionFactory, init_test_logging};

async fn server() -> MockRegistryServer {
    init_test_logging();
    let registry = MemoryRegistry::new(VersionFactory::package(), "acme/api");
    registry.open_pull_requests([2]);
    registry.add_versions(VersionFactory::untagged_series(0, 7));
    registry.add_versions([
        VersionFactory::tagged(10, 0, &["pr-1"]),
        VersionFactory::tagged(11, 0, &["pr-2"]),
    ]);
    MockRegistryServer::start(registry).await
}

/// Runs the binary with a clean environment. The server keeps answering on
/// the runtime's other workers while this blocks.
async fn run_sweep(server: &MockRegistryServer, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sweep"));
    command
        .arg("--api-url")
        .arg(server.base_url())
        .args(args)
        .env_remove("GITHUB_API_URL")
        .env_remove("GITHUB_TOKEN")
        .env_remove("INPUT_USER")
        .env_remove("INPUT_ORG")
        .env_remove("INPUT_PACKAGE")
        .env("RUST_LOG", "info");

    tokio::task::spawn_blocking(move || command.output().expect("run sweep binary"))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_json_plan_writes_only_json_to_stdout() {
    let server = server().await;

    let output = run_sweep(
        &server,
        &["--format", "json", "plan", "--org", "acme", "--package", "api"],
    )
    .await;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["package"], "org:acme/api");
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["deletions"]["outcomes"].as_array().unwrap().len(), 2);

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("starting sweep"));
    assert!(server.registry().nothing_deleted());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_json_logs_stay_off_stdout() {
    let server = server().await;

    let output = run_sweep(
        &server,
        &[
            "--format",
            "json",
            "--log-format",
            "json",
            "prune",
            "--org",
            "acme",
            "--package",
            "api",
        ],
    )
    .await;

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["deletions"]["outcomes"][0]["version_id"], 10);
    assert_eq!(server.registry().deleted_ids(), vec![10, 5]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_conflicting_owner_exits_without_requests() {
    let server = server().await;

    let output = run_sweep(
        &server,
        &["plan", "--user", "octocat", "--org", "acme", "--package", "api"],
    )
    .await;

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("only one of user or org can be specified"));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_prune_with_conflicting_owner_sends_no_requests() {
    let server = server().await;
    let cli = Cli::parse_from([
        "sweep",
        "--api-url",
        server.base_url(),
        "prune",
        "--user",
        "octocat",
        "--org",
        "acme",
        "--package",
        "api",
    ]);
    let config = cli.config();
    let Commands::Prune(args) = cli.command else {
        panic!("expected prune");
    };

    let err = sweep_cli::commands::prune::execute(args, &config)
        .await
        .unwrap_err();

    assert!(err.downcast::<sweep_core::Error>().unwrap().is_configuration());
    assert!(server.requests().is_empty());
    assert!(server.registry().operations().is_empty());
}

#[tokio::test]
async fn test_prune_without_owner_sends_no_requests() {
    let server = server().await;
    let cli = Cli::parse_from([
        "sweep",
        "--api-url",
        server.base_url(),
        "prune",
        "--package",
        "api",
    ]);
    let config = cli.config();
    let Commands::Prune(args) = cli.command else {
        panic!("expected prune");
    };

    let err = sweep_cli::commands::prune::execute(args, &config)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("one of user or org must be specified"));
    assert!(server.requests().is_empty());
}
