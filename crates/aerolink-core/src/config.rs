//! Shared configuration defaults.
//!
//! Default values and environment-variable names used across crates, so the
//! CLI and any embedding orchestrator resolve settings the same way.

/// Default values
pub mod defaults {
    /// Database file used when nothing else is configured
    pub const DB_PATH: &str = "./data/aerolink.redb";
    /// Storage backend identifier
    pub const BACKEND: &str = "redb";
    /// Temperature display unit
    pub const TEMPERATURE_UNIT: &str = "C";
    /// Seconds after startup during which the reconciler checks for existing nodes
    pub const WARMUP_SECS: u64 = 60;
    /// Default log filter
    pub const LOG_FILTER: &str = "aerolink=info";
}

/// Environment variable names
pub mod env_vars {
    pub const DB_PATH: &str = "AEROLINK_DB_PATH";
    pub const BACKEND: &str = "AEROLINK_BACKEND";
    pub const TEMPERATURE_UNIT: &str = "AEROLINK_TEMPERATURE_UNIT";
    pub const WARMUP_SECS: &str = "AEROLINK_WARMUP_SECS";
    pub const LOG_JSON: &str = "AEROLINK_LOG_JSON";

    fn var(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }

    /// Database path from the environment, if set.
    pub fn db_path() -> Option<String> {
        var(DB_PATH)
    }

    /// Backend identifier from the environment, if set.
    pub fn backend() -> Option<String> {
        var(BACKEND)
    }

    /// Temperature unit from the environment, if set.
    pub fn temperature_unit() -> Option<String> {
        var(TEMPERATURE_UNIT)
    }

    /// Warm-up window in seconds from the environment, if set and valid.
    pub fn warmup_secs() -> Option<u64> {
        var(WARMUP_SECS).and_then(|s| s.trim().parse().ok())
    }

    /// Whether JSON log output is requested.
    pub fn log_json() -> bool {
        std::env::var(LOG_JSON)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(defaults::DB_PATH.ends_with(".redb"));
        assert_eq!(defaults::BACKEND, "redb");
        assert!(defaults::WARMUP_SECS > 0);
    }

    #[test]
    fn test_env_var_names_are_prefixed() {
        for name in [
            env_vars::DB_PATH,
            env_vars::BACKEND,
            env_vars::TEMPERATURE_UNIT,
            env_vars::WARMUP_SECS,
            env_vars::LOG_JSON,
        ] {
            assert!(name.starts_with("AEROLINK_"));
        }
    }
}
