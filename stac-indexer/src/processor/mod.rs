//! Processor module for the catalog ingest.
//!
//! Turns raw Sentinel-2 manifest rows into catalog records.

pub mod enrichment;
pub mod mgrs;
mod normalizer;
pub mod sentinel;
mod transform;

pub use enrichment::{HttpTileInfoSource, TileInfo, TileInfoSource};
pub use mgrs::ParsedGrid;
pub use normalizer::RecordNormalizer;
pub use sentinel::{collection_descriptor, SentinelEndpoints, COLLECTION_ID};
pub use transform::{
    aggregate, normalize_records, RecordOutcome, TransformStats, TransformStream, TransformSummary,
    DEFAULT_MAX_CONSECUTIVE_OUTAGES,
};
