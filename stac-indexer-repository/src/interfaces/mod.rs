//! Interface definitions for the index writer.
//!
//! This module defines the abstract `CatalogIndexProvider` trait that allows
//! for dependency injection and swappable search backend implementations.

mod catalog_index_provider;

pub use catalog_index_provider::CatalogIndexProvider;
