//! Object storage access.
//!
//! The ingestion controller reads manifests and the dispatcher resolves
//! `s3://` references through the [`ObjectStore`] trait. [`S3ObjectStore`] is
//! the production implementation.

mod manifest;
mod s3;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StorageError;

pub use manifest::{chunk_count, read_chunk, row_count, ManifestChunk, REQUIRED_COLUMNS};
pub use s3::{S3ObjectStore, S3Settings};

/// Read access to an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full content of an object.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Fetch an object and decode it as JSON.
    async fn get_object_json(&self, bucket: &str, key: &str) -> Result<Value, StorageError> {
        let bytes = self.get_object(bucket, key).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::decode(format!("s3://{}/{}: {}", bucket, key, e)))
    }
}
