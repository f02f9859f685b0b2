//! OpenSearch implementation of the index writer.
//!
//! This module provides a concrete implementation of `CatalogIndexProvider`
//! using OpenSearch as the backend, plus the lazily-initialised wrapper used
//! as the process-wide connection handle.

mod index_config;
mod lazy;
mod provider;

pub use index_config::{get_index_settings, IndexKind};
pub use lazy::LazyIndexProvider;
pub use provider::OpenSearchProvider;
