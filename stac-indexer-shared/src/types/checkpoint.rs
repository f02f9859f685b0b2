//! Ingestion checkpoint.
//!
//! The checkpoint is both the progress marker of a long-running file ingestion
//! and the trigger payload of every invocation of the file-based entry point.
//! Absent fields default to zero or null.

use serde::{Deserialize, Serialize};

/// Where a chunked file ingestion currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestionCheckpoint {
    /// Bucket holding the manifest file.
    pub bucket: String,
    /// Key of the manifest file.
    pub key: String,
    /// Index of the chunk to process next.
    pub current_chunk_index: u32,
    /// Index of the final chunk. `None` until the controller has sized the file.
    pub last_chunk_index: Option<u32>,
    /// Identifies the run across continuations.
    pub invocation_reference: Option<String>,
    /// Number of retries already spent on the current chunk.
    pub retry_count: u32,
}

impl IngestionCheckpoint {
    /// A fresh checkpoint at the start of a file.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    /// Set the final chunk index.
    pub fn with_last_chunk_index(mut self, last_chunk_index: u32) -> Self {
        self.last_chunk_index = Some(last_chunk_index);
        self
    }

    /// Checkpoint for the next chunk, with the retry budget reset.
    pub fn advanced(&self) -> Self {
        Self {
            current_chunk_index: self.current_chunk_index + 1,
            retry_count: 0,
            ..self.clone()
        }
    }

    /// Checkpoint for another attempt at the current chunk.
    pub fn retried(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }

    /// True once every chunk has been processed.
    ///
    /// A checkpoint whose final chunk is still unknown is never complete.
    pub fn is_complete(&self) -> bool {
        self.last_chunk_index
            .is_some_and(|last| self.current_chunk_index > last)
    }

    /// True when the current chunk is the final one.
    pub fn is_last_chunk(&self) -> bool {
        self.last_chunk_index == Some(self.current_chunk_index)
    }
}
