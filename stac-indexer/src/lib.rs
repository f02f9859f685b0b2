//! # STAC Indexer
//!
//! Ingests Sentinel-2 tile inventories into a STAC catalog held in OpenSearch.
//!
//! ## Architecture
//!
//! The indexer follows the Consumer-Processor-Loader pattern:
//!
//! 1. **Consumer**: Receives message batches and resolves them into items
//! 2. **Processor**: Normalizes manifest rows into catalog records
//! 3. **Loader**: Writes items into OpenSearch in batches
//! 4. **Orchestrator**: Drives a manifest through the processor one chunk per invocation
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`consumer`]: Fan-in dispatcher for message batches
//! - [`processor`]: Record normalization and the transform stream
//! - [`geometry`]: Coordinate reference systems and reprojection
//! - [`storage`]: Object storage and manifest reading
//! - [`loader`]: Indexes items into OpenSearch
//! - [`orchestrator`]: Chunked ingestion controller
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod consumer;
pub mod errors;
pub mod geometry;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod storage;

pub use config::Dependencies;
pub use errors::IngestError;

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The invocation payload could not be read or understood.
    #[error("Invalid event: {0}")]
    EventError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create an event error.
    pub fn event(msg: impl Into<String>) -> Self {
        Self::EventError(msg.into())
    }
}
