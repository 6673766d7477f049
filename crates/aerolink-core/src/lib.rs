//! Core traits and types for Aerolink.
//!
//! This crate defines the foundational abstractions shared by the device
//! engine, the storage backends and the CLI:
//!
//! - [`StateStore`]: the hierarchical object store the reconciler writes into
//! - [`StorageBackend`]: the key/value layer concrete stores are built on
//! - [`StatePath`], [`PointValue`], [`PointMetadata`]: the vocabulary both sides share

pub mod config;
pub mod state;
pub mod storage;

pub use state::{PointMetadata, PointValue, StatePath, StateStore, ValueKind};
pub use storage::{Result as StorageResult, StorageBackend, StorageError};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::config::{defaults, env_vars};
    pub use crate::state::{PointMetadata, PointValue, StatePath, StateStore, ValueKind};
    pub use crate::storage::{StorageBackend, StorageError};
}
