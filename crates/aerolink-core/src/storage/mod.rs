//! Byte-level persistence beneath the state tree.
//!
//! A [`StorageBackend`] holds serialized object-tree nodes keyed by their
//! dotted state path, grouped into tables. The typed [`StateStore`] view is
//! built on top of it in `aerolink-storage`.
//!
//! [`StateStore`]: crate::state::StateStore

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Creating the database directory or file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored node could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unknown backend name or malformed backend options.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The database refused a transaction.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Table-scoped key/value store for serialized nodes.
///
/// Keys are state paths. `scan` returns keys in ascending order so that a
/// device subtree comes back as one contiguous run.
pub trait StorageBackend: Send + Sync {
    fn write(&self, table: &str, key: &str, value: &[u8]) -> Result<()>;

    fn read(&self, table: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Returns whether the key was present.
    fn delete(&self, table: &str, key: &str) -> Result<bool>;

    /// All entries of `table` whose key starts with `prefix`, ordered by key.
    fn scan(&self, table: &str, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;

    /// Whether state survives a restart.
    fn is_persistent(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names_failing_path() {
        let err = StorageError::Backend("write refused for dev.MainPower".to_string());
        assert!(err.to_string().contains("dev.MainPower"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: StorageError = parse.into();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
