//! Tests for the `command` command.

use predicates::prelude::*;

use super::aerolink;

/// Test that fan speed AUTO also switches on automatic mode.
#[test]
fn test_command_fan_speed_auto() {
    aerolink()
        .args(["--serial", "NN2-EU-KKA0717A", "--product-type", "438"])
        .args(["command", "FanSpeed", "AUTO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Topic: 438/NN2-EU-KKA0717A/command"))
        .stdout(predicate::str::contains(r#""msg":"STATE-SET""#))
        .stdout(predicate::str::contains(r#""auto":"ON""#))
        .stdout(predicate::str::contains(r#""fnsp":"AUTO""#));
}

/// Test that the temperature target honours the configured unit.
#[test]
fn test_command_temperature_target() {
    aerolink()
        .args(["--serial", "NN2-EU-KKA0717A", "--product-type", "527"])
        .args(["--unit", "C"])
        .args(["command", "TemperatureTarget", "25"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""hmax":"2982""#));
}

/// Test that a command needs a device serial.
#[test]
fn test_command_requires_serial() {
    aerolink()
        .args(["command", "MainPower", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No device serial configured"));
}

/// Test that values that cannot be encoded are rejected.
#[test]
fn test_command_rejects_unencodable_value() {
    aerolink()
        .args(["--serial", "X", "command", "FanSpeed", "turbo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot encode"));
}
