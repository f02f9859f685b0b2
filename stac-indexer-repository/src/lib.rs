//! # STAC Indexer Repository
//!
//! This crate provides the index writer contract used by the ingestion
//! pipeline and its OpenSearch implementation. It includes the error type,
//! index names and mappings, and a lazily-connected provider that is shared
//! process-wide.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use config::OpenSearchConfig;
pub use errors::IndexError;
pub use interfaces::CatalogIndexProvider;
pub use opensearch::{IndexKind, LazyIndexProvider, OpenSearchProvider};
pub use types::{BatchOperationResult, BatchOperationSummary};
