//! Binary surface tests
//!
//! The relay is deployed configured purely through environment variables;
//! these verify the help output documents that surface and that bad values
//! are rejected before anything connects.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_documents_environment_surface() {
    Command::cargo_bin("solr-sync")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("RABBITMQ_QUEUE"))
        .stdout(predicate::str::contains("RABBITMQ_PREFETCH"))
        .stdout(predicate::str::contains("SOLR_UPDATER_BASE_URL"))
        .stdout(predicate::str::contains("RETRY_LIMIT"))
        .stdout(predicate::str::contains("RABBITMQ_RETRY_EXCHANGE"));
}

#[test]
fn version_flag_reports_version() {
    Command::cargo_bin("solr-sync")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("solr-sync"));
}

#[test]
fn invalid_prefetch_is_rejected() {
    Command::cargo_bin("solr-sync")
        .unwrap()
        .args(["--prefetch", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--prefetch"));
}

#[test]
fn unknown_flag_is_rejected() {
    Command::cargo_bin("solr-sync")
        .unwrap()
        .arg("--definitely-not-a-flag")
        .assert()
        .failure();
}
