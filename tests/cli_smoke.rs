//! CLI smoke tests: flag handling only, no network traffic

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

/// Helper function to create a test command
fn create_test_cmd() -> Command {
    Command::cargo_bin("spv").unwrap()
}

#[test]
fn test_help_lists_flags() {
    create_test_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--endpoint"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--no-color"));
}

#[test]
fn test_version_flag() {
    create_test_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_conflicting_color_flags_rejected() {
    create_test_cmd()
        .args(["--color", "--no-color"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("CONFIG"));
}

#[test]
fn test_invalid_endpoint_rejected() {
    create_test_cmd()
        .args(["--endpoint", "ftp://example.net", "--no-color"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("scheme"));
}

#[test]
fn test_unparseable_endpoint_rejected() {
    create_test_cmd()
        .args(["--endpoint", "not a url"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid endpoint URL"));
}
