//! End-to-end CLI tests for the catalog-fetch binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod support;
use support::site::{self, ACCOUNT, CREDENTIAL};
use support::socket_guard::{socket_skip_return, start_mock_server_or_skip};

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return socket_skip_return();
        };
        mock_server
    }};
}

fn catalog_fetch() -> Command {
    Command::cargo_bin("catalog-fetch").unwrap()
}

/// Runs the binary off the async runtime so the mock server keeps serving.
async fn run_blocking(mut cmd: Command) -> assert_cmd::assert::Assert {
    tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap()
}

#[test]
fn test_binary_without_arguments_is_usage_error() {
    catalog_fetch()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_binary_with_one_argument_is_usage_error() {
    catalog_fetch().arg(ACCOUNT).assert().code(2);
}

#[test]
fn test_binary_with_three_arguments_is_usage_error() {
    catalog_fetch()
        .args([ACCOUNT, CREDENTIAL, "extra"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_help_displays_usage() {
    catalog_fetch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("catalog"))
        .stdout(predicate::str::contains("--workers"));
}

#[test]
fn test_binary_version_displays_version() {
    catalog_fetch()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("catalog-fetch"));
}

#[test]
fn test_binary_rejects_zero_workers() {
    catalog_fetch()
        .args([ACCOUNT, CREDENTIAL, "-w", "0"])
        .assert()
        .code(2);
}

#[test]
fn test_binary_bad_base_url_exits_one() {
    catalog_fetch()
        .args([ACCOUNT, CREDENTIAL, "--base-url", "not a url"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid configuration"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_failed_sign_in_exits_one() {
    let mock_server = require_mock_server!();
    site::mount_sign_in(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let mut cmd = catalog_fetch();
    cmd.args([ACCOUNT, "wrong", "--base-url", mock_server.uri().as_str(), "-o"])
        .arg(dir.path());

    run_blocking(cmd)
        .await
        .code(1)
        .stderr(predicate::str::contains("sign-in"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_successful_run_exits_zero() {
    let mock_server = require_mock_server!();
    site::mount_sign_in(&mock_server).await;
    site::mount_catalog(&mock_server, &["first", "second"]).await;
    site::mount_item(&mock_server, "first", b"1").await;
    site::mount_item(&mock_server, "second", b"22").await;

    let dir = TempDir::new().unwrap();
    let mut cmd = catalog_fetch();
    cmd.args([ACCOUNT, CREDENTIAL, "-w", "2", "--base-url", mock_server.uri().as_str(), "-o"])
        .arg(dir.path());

    run_blocking(cmd).await.success();
    assert_eq!(std::fs::read(dir.path().join("first.mov")).unwrap(), b"1");
    assert_eq!(std::fs::read(dir.path().join("second.mov")).unwrap(), b"22");
}
