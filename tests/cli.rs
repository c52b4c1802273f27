//! Binary smoke tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_usage_and_endpoints() {
    Command::cargo_bin("domain-smith")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("USAGE:"))
        .stdout(predicate::str::contains("POST /generate"))
        .stdout(predicate::str::contains("DOMAIN_SMITH_PORT"));
}

#[test]
fn test_invalid_configuration_fails() {
    Command::cargo_bin("domain-smith")
        .unwrap()
        .arg("web")
        .env("DOMAIN_SMITH_WHOIS_MAX_WORKERS", "zero")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}
