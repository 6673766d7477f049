//! Storage for Aerolink.
//!
//! Provides the [`ObjectTreeStore`], a hierarchical state store that the
//! device engine reconciles into, on top of pluggable key/value backends:
//!
//! | Backend | Persistent | Notes |
//! |---------|------------|-------|
//! | `redb` | yes | single unified table, LRU read cache |
//! | `memory` | no | ordered map, for tests and dry runs |

pub mod backends;
pub mod object_tree;

pub use aerolink_core::storage::{Result, StorageBackend, StorageError};
pub use backends::{
    available_backends, create_backend, MemoryBackend, MemoryBackendConfig, RedbBackend,
    RedbBackendConfig,
};
pub use object_tree::{ObjectNode, ObjectTreeStore};

use std::path::Path;
use std::sync::Arc;

/// Open an object store backed by a redb file.
pub fn open_object_store<P: AsRef<Path>>(path: P) -> Result<ObjectTreeStore> {
    let backend = RedbBackend::open(path)?;
    Ok(ObjectTreeStore::new(Arc::new(backend)))
}

/// Object store that lives only in memory.
pub fn memory_object_store() -> ObjectTreeStore {
    ObjectTreeStore::new(Arc::new(MemoryBackend::default()))
}
