//! Command-specific CLI tests.

mod command_test;
mod replay_test;
mod schema_test;

use assert_cmd::Command;

/// The binary with no `AEROLINK_*` settings leaking in from the environment.
pub fn aerolink() -> Command {
    let mut cmd = Command::cargo_bin("aerolink").unwrap();
    for var in [
        "AEROLINK_DB_PATH",
        "AEROLINK_BACKEND",
        "AEROLINK_TEMPERATURE_UNIT",
        "AEROLINK_WARMUP_SECS",
        "AEROLINK_LOG_JSON",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}
