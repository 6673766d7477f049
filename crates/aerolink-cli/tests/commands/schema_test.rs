//! Tests for the `schema` command.

use predicates::prelude::*;

use super::aerolink;

/// Test that the schema lists wire codes and derived points.
#[test]
fn test_schema_lists_points() {
    aerolink()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("fnsp"))
        .stdout(predicate::str::contains("FanSpeed"))
        .stdout(predicate::str::contains("Derived points"))
        .stdout(predicate::str::contains("AirQuality"));
}
