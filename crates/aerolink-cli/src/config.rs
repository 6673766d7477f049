//! CLI configuration.
//!
//! Settings are resolved from several sources, highest priority first:
//! 1. command-line flags
//! 2. environment variables (`AEROLINK_*`)
//! 3. the TOML file given with `--config`
//! 4. built-in defaults

use std::path::{Path, PathBuf};

use aerolink_core::config::{defaults, env_vars};
use aerolink_devices::{DeviceContext, TemperatureUnit};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub store: StoreSection,
    pub device: DeviceSection,
    pub reconciler: ReconcilerSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: Option<String>,
    pub backend: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    pub serial: Option<String>,
    pub product_type: Option<String>,
    pub temperature_unit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReconcilerSection {
    pub warmup_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!(
            category = "config",
            "Loading config from: {}",
            path.display()
        );
        Ok(config)
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub db_path: Option<PathBuf>,
    pub backend: Option<String>,
    pub serial: Option<String>,
    pub product_type: Option<String>,
    pub temperature_unit: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub backend: String,
    pub serial: Option<String>,
    pub product_type: Option<String>,
    pub temperature_unit: TemperatureUnit,
    pub warmup_secs: u64,
}

impl Settings {
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self> {
        let db_path = overrides
            .db_path
            .or_else(|| env_vars::db_path().map(PathBuf::from))
            .or_else(|| file.store.path.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(defaults::DB_PATH));

        let backend = overrides
            .backend
            .or_else(env_vars::backend)
            .or(file.store.backend)
            .unwrap_or_else(|| defaults::BACKEND.to_string());

        let unit = overrides
            .temperature_unit
            .or_else(env_vars::temperature_unit)
            .or(file.device.temperature_unit)
            .unwrap_or_else(|| defaults::TEMPERATURE_UNIT.to_string());
        let temperature_unit = unit
            .parse::<TemperatureUnit>()
            .map_err(|e| anyhow!("{}", e))?;

        let warmup_secs = env_vars::warmup_secs()
            .or(file.reconciler.warmup_secs)
            .unwrap_or(defaults::WARMUP_SECS);

        Ok(Self {
            db_path,
            backend,
            serial: overrides.serial.or(file.device.serial),
            product_type: overrides.product_type.or(file.device.product_type),
            temperature_unit,
            warmup_secs,
        })
    }

    /// Context for the configured device.
    pub fn device_context(&self) -> Result<DeviceContext> {
        let serial = self
            .serial
            .as_deref()
            .context("No device serial configured (use --serial or [device] serial)")?;
        let product_type = self.product_type.as_deref().unwrap_or_default();
        Ok(DeviceContext::new(serial, product_type).with_temperature_unit(self.temperature_unit))
    }
}
