//! Tests for the `replay` and `show` commands.

use predicates::prelude::*;
use tempfile::TempDir;

use super::aerolink;

const MESSAGES: &str = r#"{"msg":"CURRENT-STATE","time":"2024-05-01T10:00:00.000Z","product-state":{"fpwr":"ON","fnsp":"0004","filf":"2150"}}
{"msg":"ENVIRONMENTAL-CURRENT-SENSOR-DATA","time":"2024-05-01T10:00:01.000Z","data":{"tact":"2982","pm25":"0040"}}
{"msg":"STATE-CHANGE","product-state":{"fnsp":["0004","0004"]}}
{"data":"broken"}
"#;

fn write_messages(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("messages.jsonl");
    std::fs::write(&path, MESSAGES).unwrap();
    path
}

/// Test that replay reports a summary and persists state that show can read back.
#[test]
fn test_replay_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let messages = write_messages(&dir);
    let db = dir.path().join("state.redb");

    aerolink()
        .arg("--db")
        .arg(&db)
        .args(["--serial", "NN2-EU-KKA0717A", "--product-type", "438"])
        .arg("replay")
        .arg(&messages)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Replayed 4 messages for NN2-EU-KKA0717A (Pure Cool Tower):",
        ))
        .stdout(predicate::str::contains("1 unchanged"))
        .stdout(predicate::str::contains("1 dropped"));

    aerolink()
        .arg("--db")
        .arg(&db)
        .args(["show", "NN2-EU-KKA0717A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NN2-EU-KKA0717A.FanSpeed = 4"))
        .stdout(predicate::str::contains("NN2-EU-KKA0717A.FilterLifePercent = 50 %"))
        .stdout(predicate::str::contains("NN2-EU-KKA0717A.Sensor.Temperature = 25.05 °C"))
        .stdout(predicate::str::contains("NN2-EU-KKA0717A.Sensor.PM25Index = 1"))
        .stdout(predicate::str::contains("NN2-EU-KKA0717A.AirQuality = 1"));
}

/// Test that a JSON array file is accepted as well.
#[test]
fn test_replay_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("messages.json");
    std::fs::write(
        &path,
        r#"[{"product-state":{"fpwr":"OFF"}},{"product-state":{"oson":"ON"}}]"#,
    )
    .unwrap();

    aerolink()
        .args(["--backend", "memory", "--serial", "dev", "replay"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Replayed 2 messages for dev: 2 updates applied"));
}

/// Test that invalid JSON lines are reported with their line number.
#[test]
fn test_replay_invalid_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.jsonl");
    std::fs::write(&path, "{\"data\":{}}\nnot json\n").unwrap();

    aerolink()
        .args(["--backend", "memory", "--serial", "dev", "replay"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

/// Test that show on an empty store says so.
#[test]
fn test_show_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    aerolink()
        .arg("--db")
        .arg(dir.path().join("empty.redb"))
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored state."));
}
