//! Integration tests for the usbmatch CLI.
//!
//! These cover the paths that fail before any bus connection is made, so
//! they run without a UDisks daemon.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

/// Get usbmatch command with the config environment cleared.
fn usbmatch() -> Command {
    let mut cmd = cargo_bin_cmd!("usbmatch");
    cmd.env_remove("USBMATCH_CONFIG");
    cmd
}

#[test]
fn cli_no_args_shows_help() {
    usbmatch()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn cli_help_lists_commands() {
    usbmatch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("volume"));
}

#[test]
fn cli_rejects_unknown_backend() {
    usbmatch()
        .args(["--backend", "hal", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'hal'"));
}

#[test]
fn check_without_properties_fails() {
    usbmatch()
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No device properties to match"));
}

#[test]
fn check_with_only_empty_values_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("usbmatch.json");
    config
        .write_str(r#"{"backend": "udisks1", "device": {"serial": "", "vendor": ""}}"#)
        .unwrap();

    usbmatch()
        .arg("--config")
        .arg(config.path())
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No device properties to match"));
}

#[test]
fn missing_config_file_fails() {
    usbmatch()
        .args(["--config", "/nonexistent/usbmatch.json", "check"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read config"));
}

#[test]
fn invalid_config_json_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("usbmatch.json");
    config.write_str("{ not json").unwrap();

    usbmatch()
        .env("USBMATCH_CONFIG", config.path())
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid config"));
}

#[test]
fn volume_without_uuid_fails() {
    usbmatch()
        .args(["--serial", "ABC123", "volume"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No volume UUID configured"));
}
