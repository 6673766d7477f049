//! In-memory storage backend.
//!
//! Used for tests and for dry runs where nothing should touch the disk.

use std::collections::BTreeMap;

use aerolink_core::storage::{Result, StorageBackend};
use parking_lot::RwLock;

/// Configuration for MemoryBackend.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct MemoryBackendConfig {}

/// Ordered map keyed by `(table, key)`.
#[derive(Default)]
pub struct MemoryBackend {
    data: RwLock<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new(_config: MemoryBackendConfig) -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn write(&self, table: &str, key: &str, value: &[u8]) -> Result<()> {
        self.data
            .write()
            .insert((table.to_string(), key.to_string()), value.to_vec());
        Ok(())
    }

    fn read(&self, table: &str, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .data
            .read()
            .get(&(table.to_string(), key.to_string()))
            .cloned())
    }

    fn delete(&self, table: &str, key: &str) -> Result<bool> {
        Ok(self
            .data
            .write()
            .remove(&(table.to_string(), key.to_string()))
            .is_some())
    }

    fn scan(&self, table: &str, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let start = (table.to_string(), prefix.to_string());
        Ok(self
            .data
            .read()
            .range(start..)
            .take_while(|((t, k), _)| t == table && k.starts_with(prefix))
            .map(|((_, k), v)| (k.clone(), v.clone()))
            .collect())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}
