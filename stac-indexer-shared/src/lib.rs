//! # STAC Indexer Shared
//!
//! This crate defines the data structures shared across the catalog ingestion
//! workspace: raw manifest rows, geometries, normalized catalog records,
//! collection descriptors and ingestion checkpoints.

pub mod types;

pub use types::catalog_record::{Asset, CatalogItem, CatalogRecord, Link};
pub use types::checkpoint::IngestionCheckpoint;
pub use types::collection::{BandDescriptor, CollectionDescriptor, Provider};
pub use types::geometry::{Geometry, NamedCrs, Position, SourceGeometry};
pub use types::raw_tile_record::RawTileRecord;
