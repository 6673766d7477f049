//! Storage backend implementations.

use std::sync::Arc;

use aerolink_core::storage::{Result, StorageBackend, StorageError};
use serde_json::Value;

pub mod memory;
pub mod redb;

pub use self::memory::{MemoryBackend, MemoryBackendConfig};
pub use self::redb::{RedbBackend, RedbBackendConfig};

/// Create a storage backend by type identifier.
///
/// # Example
/// ```no_run
/// use aerolink_storage::backends::create_backend;
/// use serde_json::json;
///
/// # fn main() -> anyhow::Result<()> {
/// let backend = create_backend("redb", &json!({ "path": "./data/aerolink.redb" }))?;
/// # Ok(())
/// # }
/// ```
pub fn create_backend(backend_type: &str, config: &Value) -> Result<Arc<dyn StorageBackend>> {
    match backend_type {
        "redb" => {
            let cfg: RedbBackendConfig = serde_json::from_value(config.clone()).map_err(|e| {
                StorageError::Configuration(format!("Invalid redb config: {}", e))
            })?;
            Ok(Arc::new(RedbBackend::new(cfg)?))
        }
        "memory" => {
            let cfg: MemoryBackendConfig =
                serde_json::from_value(config.clone()).map_err(|e| {
                    StorageError::Configuration(format!("Invalid memory config: {}", e))
                })?;
            Ok(Arc::new(MemoryBackend::new(cfg)))
        }
        _ => Err(StorageError::Configuration(format!(
            "Unknown backend type: {}. Available backends: {}",
            backend_type,
            available_backends().join(", ")
        ))),
    }
}

/// Backend type identifiers accepted by [`create_backend`].
pub fn available_backends() -> Vec<&'static str> {
    vec!["redb", "memory"]
}
