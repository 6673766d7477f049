//! Device engine errors.

use aerolink_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeviceError>;

#[derive(Debug, Error)]
pub enum DeviceError {
    /// Envelope nesting the normalizer cannot interpret; the message is dropped
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// State store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for DeviceError {
    fn from(e: serde_json::Error) -> Self {
        DeviceError::Serialization(e.to_string())
    }
}
