//! Core data structures used across the catalog indexer.

pub mod catalog_record;
pub mod checkpoint;
pub mod collection;
pub mod geometry;
pub mod raw_tile_record;

pub use catalog_record::{Asset, CatalogItem, CatalogRecord, Link};
pub use checkpoint::IngestionCheckpoint;
pub use collection::{BandDescriptor, CollectionDescriptor, Provider};
pub use geometry::{Geometry, NamedCrs, Position, SourceGeometry};
pub use raw_tile_record::RawTileRecord;
