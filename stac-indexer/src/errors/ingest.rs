//! Error types for chunked ingestion.
//!
//! These are the errors that reach the chunk controller. Each one is either
//! retryable (the chunk is attempted again in a later invocation) or fatal
//! (the run stops and needs an operator).

use stac_indexer_repository::IndexError;
use thiserror::Error;

use crate::errors::{DispatchError, StorageError};

/// Errors that can occur while ingesting a chunk or a message batch.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The input file does not exist.
    #[error("Input not found: s3://{bucket}/{key}")]
    InputNotFound { bucket: String, key: String },

    /// Transient object storage failure.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// The manifest cannot be read as an inventory CSV.
    #[error("Manifest error: {0}")]
    ManifestError(String),

    /// The enrichment source failed repeatedly within one chunk.
    #[error("Enrichment source unavailable: {0}")]
    EnrichmentUnavailable(String),

    /// Writing to the index failed as a whole.
    #[error("Index write failed: {0}")]
    IndexWriteFailed(#[from] IndexError),

    /// The chunk kept failing until the retry budget ran out.
    #[error("Retry ceiling exceeded on chunk {chunk_index} after {retries} retries: {last_error}")]
    RetryCeilingExceeded {
        chunk_index: u32,
        retries: u32,
        last_error: String,
    },

    /// The continuation could not be scheduled.
    #[error("Scheduler error: {0}")]
    SchedulerError(String),

    /// Message resolution failed for the whole batch.
    #[error("Dispatch error: {0}")]
    DispatchError(#[from] DispatchError),

    /// The trigger payload could not be interpreted.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl IngestError {
    /// Create a manifest error.
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::ManifestError(msg.into())
    }

    /// Create a scheduler error.
    pub fn scheduler(msg: impl Into<String>) -> Self {
        Self::SchedulerError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Whether a later attempt at the same chunk may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StorageError(_)
            | Self::EnrichmentUnavailable(_)
            | Self::SchedulerError(_) => true,
            Self::IndexWriteFailed(e) => e.is_connection_level(),
            Self::InputNotFound { .. }
            | Self::ManifestError(_)
            | Self::RetryCeilingExceeded { .. }
            | Self::DispatchError(_)
            | Self::ParseError(_) => false,
        }
    }
}

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { bucket, key } => Self::InputNotFound { bucket, key },
            StorageError::Transient(msg) => Self::StorageError(msg),
            StorageError::Decode(msg) => Self::ManifestError(msg),
        }
    }
}
