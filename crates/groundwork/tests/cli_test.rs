#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! migration

use assert_cmd::Command;
use predicates::prelude::*;

const DEV_CERT: &str = "arn:aws:acm:us-east-1:111111111111:certificate/dev";

fn ground() -> Command {
    let mut cmd = Command::cargo_bin("ground").unwrap();
    cmd.env_remove("GROUNDWORK_ENV")
        .env_remove("GROUNDWORK_CERT_ARN_DEV")
        .env_remove("GROUNDWORK_CERT_ARN_PROD");
    cmd
}

#[test]
fn test_cli_help() {
    ground()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("synth"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("down"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_cli_version() {
    ground()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("groundwork"));
}

#[test]
fn test_invalid_command() {
    ground().arg("invalid-command").assert().failure();
}

#[test]
fn test_unknown_environment_fails_closed() {
    ground()
        .arg("synth")
        .arg("staging")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown environment"));
}

#[test]
fn test_synth_requires_a_certificate() {
    ground()
        .arg("synth")
        .arg("dev")
        .assert()
        .failure()
        .stderr(predicate::str::contains("certificate"));
}

#[test]
fn test_synth_prints_the_batch() {
    ground()
        .env("GROUNDWORK_CERT_ARN_DEV", DEV_CERT)
        .arg("synth")
        .arg("dev")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"environment\": \"dev\""))
        .stdout(predicate::str::contains("media-dev"))
        .stdout(predicate::str::contains("security-group"))
        .stdout(predicate::str::contains("work-queue-dev"));
}

#[test]
fn test_synth_env_flag_backward_compat() {
    // -e is hidden but still parses.
    ground()
        .env("GROUNDWORK_CERT_ARN_DEV", DEV_CERT)
        .arg("synth")
        .arg("-e")
        .arg("dev")
        .assert()
        .success()
        .stdout(predicate::str::contains("media-dev"));
}

#[test]
fn test_synth_conflict_positional_and_flag() {
    ground()
        .arg("synth")
        .arg("dev")
        .arg("-e")
        .arg("prod")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_validate_summarizes_the_topology() {
    ground()
        .env("GROUNDWORK_CERT_ARN_DEV", DEV_CERT)
        .arg("validate")
        .arg("dev")
        .assert()
        .success()
        .stdout(predicate::str::contains("Topology is valid"))
        .stdout(predicate::str::contains("Database ingress rules: 3"));
}

#[test]
fn test_validate_without_certificate_fails() {
    ground()
        .arg("validate")
        .arg("prod")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GROUNDWORK_CERT_ARN_PROD"));
}

#[test]
fn test_up_writes_state_and_batch() {
    let dir = tempfile::tempdir().unwrap();
    ground()
        .current_dir(dir.path())
        .env("GROUNDWORK_CERT_ARN_DEV", DEV_CERT)
        .arg("up")
        .arg("dev")
        .arg("--skip-replication")
        .assert()
        .success()
        .stdout(predicate::str::contains("Provisioning complete"));

    assert!(dir.path().join(".groundwork/state.json").exists());
    assert!(dir.path().join(".groundwork/out/batch-dev.json").exists());
}

#[test]
fn test_up_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    for _ in 0..2 {
        ground()
            .current_dir(dir.path())
            .env("GROUNDWORK_CERT_ARN_DEV", DEV_CERT)
            .arg("up")
            .arg("dev")
            .arg("--skip-replication")
            .assert()
            .success();
    }

    // Second run plans no changes against the recorded state.
    ground()
        .current_dir(dir.path())
        .env("GROUNDWORK_CERT_ARN_DEV", DEV_CERT)
        .arg("up")
        .arg("dev")
        .arg("--skip-replication")
        .assert()
        .success()
        .stdout(predicate::str::contains("already provisioned"));
}

#[test]
fn test_down_with_nothing_recorded() {
    let dir = tempfile::tempdir().unwrap();
    ground()
        .current_dir(dir.path())
        .arg("down")
        .arg("dev")
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to tear down"));
}

#[test]
fn test_down_destroys_dev_but_keeps_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    ground()
        .current_dir(dir.path())
        .env("GROUNDWORK_CERT_ARN_DEV", DEV_CERT)
        .arg("up")
        .arg("dev")
        .arg("--skip-replication")
        .assert()
        .success();

    // The artifact bucket is retained in every environment and must survive.
    ground()
        .current_dir(dir.path())
        .arg("down")
        .arg("dev")
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("left in place"))
        .stdout(predicate::str::contains("bucket:artifacts-dev"))
        .stdout(predicate::str::contains("Teardown complete"));

    let state = std::fs::read_to_string(dir.path().join(".groundwork/state.json")).unwrap();
    assert!(state.contains("artifacts-dev"));
    assert!(!state.contains("work-queue-dev"));
}
