//! Redb storage backend implementation.
//!
//! Persists every table in a single redb table using namespaced keys
//! (`table:key`), fronted by a write-through LRU cache.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aerolink_core::storage::{Result, StorageBackend, StorageError};
use lru::LruCache;
use parking_lot::Mutex;
use redb::{Database, TableDefinition, TableError};

const UNIFIED_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("aerolink_objects");

const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Path value that selects a throwaway database file.
pub const MEMORY_PATH: &str = ":memory:";

/// Configuration for RedbBackend.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct RedbBackendConfig {
    /// Path to the database file.
    pub path: String,

    /// Create parent directories if they don't exist.
    #[serde(default = "default_create_dirs")]
    pub create_dirs: bool,

    /// LRU cache capacity (number of entries). 0 disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_create_dirs() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl RedbBackendConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            create_dirs: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    pub fn with_create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Config for a database that is deleted when the backend is dropped.
    pub fn memory() -> Self {
        Self {
            path: MEMORY_PATH.to_string(),
            create_dirs: false,
            cache_capacity: 256,
        }
    }
}

fn make_key(table: &str, key: &str) -> String {
    let mut result = String::with_capacity(table.len() + key.len() + 1);
    result.push_str(table);
    result.push(':');
    result.push_str(key);
    result
}

fn backend_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(e.to_string())
}

/// redb-backed persistent storage.
pub struct RedbBackend {
    db: Arc<Database>,
    path: String,
    /// Backing file of a `:memory:` database, removed on drop.
    temp_path: Option<PathBuf>,
    /// `None` when caching is disabled.
    cache: Option<Mutex<LruCache<String, Vec<u8>>>>,
}

impl RedbBackend {
    pub fn new(config: RedbBackendConfig) -> Result<Self> {
        let (db, temp_path) = if config.path == MEMORY_PATH {
            // redb has no in-memory mode that survives reopening; use a temp file.
            let temp_path =
                std::env::temp_dir().join(format!("aerolink_{}.redb", uuid::Uuid::new_v4()));
            let db = Database::create(&temp_path).map_err(backend_err)?;
            (db, Some(temp_path))
        } else {
            let path = Path::new(&config.path);
            if config.create_dirs {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
            }
            // `create` opens an existing file without truncating it.
            (Database::create(path).map_err(backend_err)?, None)
        };

        let cache = NonZeroUsize::new(config.cache_capacity)
            .map(|capacity| Mutex::new(LruCache::new(capacity)));

        tracing::debug!(path = %config.path, "Opened redb backend");

        Ok(Self {
            db: Arc::new(db),
            path: config.path,
            temp_path,
            cache,
        })
    }

    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(RedbBackendConfig::new(path.as_ref().to_string_lossy().to_string()))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn cache_put(&self, key: String, value: Vec<u8>) {
        if let Some(cache) = &self.cache {
            cache.lock().put(key, value);
        }
    }
}

impl StorageBackend for RedbBackend {
    fn write(&self, table: &str, key: &str, value: &[u8]) -> Result<()> {
        let namespaced = make_key(table, key);

        let txn = self.db.begin_write().map_err(backend_err)?;
        {
            let mut t = txn.open_table(UNIFIED_TABLE).map_err(backend_err)?;
            t.insert(namespaced.as_str(), value).map_err(backend_err)?;
        }
        txn.commit().map_err(backend_err)?;

        self.cache_put(namespaced, value.to_vec());
        Ok(())
    }

    fn read(&self, table: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let namespaced = make_key(table, key);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.lock().get(&namespaced) {
                return Ok(Some(hit.clone()));
            }
        }

        let txn = self.db.begin_read().map_err(backend_err)?;
        let t = match txn.open_table(UNIFIED_TABLE) {
            Ok(t) => t,
            // Nothing has been written yet.
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(backend_err(e)),
        };

        match t.get(namespaced.as_str()).map_err(backend_err)? {
            Some(value) => {
                let data = value.value().to_vec();
                self.cache_put(namespaced, data.clone());
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, table: &str, key: &str) -> Result<bool> {
        let namespaced = make_key(table, key);

        if let Some(cache) = &self.cache {
            cache.lock().pop(&namespaced);
        }

        let txn = self.db.begin_write().map_err(backend_err)?;
        let removed = {
            let mut t = txn.open_table(UNIFIED_TABLE).map_err(backend_err)?;
            let removed = t.remove(namespaced.as_str()).map_err(backend_err)?;
            removed.is_some()
        };
        txn.commit().map_err(backend_err)?;
        Ok(removed)
    }

    fn scan(&self, table: &str, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let table_prefix = make_key(table, prefix);
        let strip = table.len() + 1;

        let txn = self.db.begin_read().map_err(backend_err)?;
        let t = match txn.open_table(UNIFIED_TABLE) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(backend_err(e)),
        };

        // Keys are ordered, so every match sits in one contiguous run.
        let mut results = Vec::new();
        for item in t.range(table_prefix.as_str()..).map_err(backend_err)? {
            let (key, value) = item.map_err(backend_err)?;
            let key = key.value();
            if !key.starts_with(&table_prefix) {
                break;
            }
            results.push((key[strip..].to_string(), value.value().to_vec()));
        }

        Ok(results)
    }

    fn is_persistent(&self) -> bool {
        self.temp_path.is_none()
    }
}

impl Drop for RedbBackend {
    fn drop(&mut self) {
        if let Some(temp_path) = &self.temp_path {
            if let Err(e) = std::fs::remove_file(temp_path) {
                tracing::debug!(
                    "Failed to remove temporary database file {}: {}",
                    temp_path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = RedbBackendConfig::new("./data/test.redb")
            .with_create_dirs(false)
            .with_cache_capacity(0);

        assert_eq!(config.path, "./data/test.redb");
        assert!(!config.create_dirs);
        assert_eq!(config.cache_capacity, 0);
    }

    #[test]
    fn test_make_key() {
        assert_eq!(make_key("objects", "dev.Sensor"), "objects:dev.Sensor");
    }

    #[test]
    fn test_memory_roundtrip_and_scan() {
        let backend = RedbBackend::new(RedbBackendConfig::memory()).unwrap();
        assert!(!backend.is_persistent());
        assert_eq!(backend.read("objects", "missing").unwrap(), None);
        assert!(backend.scan("objects", "").unwrap().is_empty());

        backend.write("objects", "a.x", b"1").unwrap();
        backend.write("objects", "a.y", b"2").unwrap();
        backend.write("objects", "b.x", b"3").unwrap();
        backend.write("other", "a.z", b"4").unwrap();

        assert_eq!(backend.read("objects", "a.y").unwrap(), Some(b"2".to_vec()));

        let scanned = backend.scan("objects", "a.").unwrap();
        let keys: Vec<_> = scanned.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a.x", "a.y"]);

        assert!(backend.delete("objects", "a.x").unwrap());
        assert!(!backend.delete("objects", "a.x").unwrap());
        assert_eq!(backend.read("objects", "a.x").unwrap(), None);
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let backend = RedbBackend::new(RedbBackendConfig::memory()).unwrap();
        let temp = backend.temp_path.clone().unwrap();
        assert!(temp.exists());
        drop(backend);
        assert!(!temp.exists());
    }
}
