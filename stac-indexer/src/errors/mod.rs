//! Error types for the catalog ingestion pipeline.
//!
//! Each component has its own error enum. Per-record and per-message errors
//! (`NormalizeError`, `DispatchError`) are caught and logged at their level;
//! `IngestError` is what reaches the chunk controller, which classifies it as
//! retryable or fatal.

mod dispatch;
mod geometry;
mod ingest;
mod normalize;
mod storage;

pub use dispatch::DispatchError;
pub use geometry::GeometryError;
pub use ingest::IngestError;
pub use normalize::{EnrichmentError, NormalizeError};
pub use storage::StorageError;
