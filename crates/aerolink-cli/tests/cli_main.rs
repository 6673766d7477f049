//! Basic CLI tests for the aerolink command-line interface.

use assert_cmd::Command;
use predicates::prelude::*;

// Include command-specific test modules
mod commands;

/// Test that the CLI binary exists and shows help.
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("aerolink").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("air purifiers"))
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("command"))
        .stdout(predicate::str::contains("schema"));
}

/// Test that the CLI shows version information.
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("aerolink").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("aerolink"));
}

/// Test that providing no subcommand shows an error.
#[test]
fn test_no_subcommand_shows_error() {
    let mut cmd = Command::cargo_bin("aerolink").unwrap();

    // Clap's error code for missing required subcommand
    cmd.assert().failure().code(2);
}

/// Test that a missing config file is reported.
#[test]
fn test_missing_config_file() {
    let mut cmd = Command::cargo_bin("aerolink").unwrap();
    cmd.arg("--config")
        .arg("/nonexistent/aerolink.toml")
        .arg("schema");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}
