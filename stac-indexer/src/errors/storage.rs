//! Error types for object storage access.
use thiserror::Error;

/// Errors reading objects from storage.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    /// The object does not exist.
    #[error("Object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },
    /// Storage could not be reached or the read was interrupted.
    #[error("Storage error: {0}")]
    Transient(String),
    /// The object exists but its content could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl StorageError {
    /// Create a not found error.
    pub fn not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create a transient error.
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}
