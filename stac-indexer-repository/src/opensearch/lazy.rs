//! Process-wide, lazily-connected provider.
//!
//! The connection is established on first use and then reused for the rest of
//! the process. Concurrent first callers wait on the same initialisation
//! instead of each opening their own connection. A failed initialisation is not
//! cached, so the next caller tries again.

use async_trait::async_trait;
use stac_indexer_shared::{CatalogItem, CollectionDescriptor};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::OpenSearchConfig;
use crate::errors::IndexError;
use crate::interfaces::CatalogIndexProvider;
use crate::opensearch::index_config::IndexKind;
use crate::opensearch::provider::OpenSearchProvider;
use crate::types::BatchOperationSummary;

/// An `OpenSearchProvider` created on first use.
pub struct LazyIndexProvider {
    config: OpenSearchConfig,
    provider: OnceCell<OpenSearchProvider>,
}

impl LazyIndexProvider {
    pub fn new(config: OpenSearchConfig) -> Self {
        Self {
            config,
            provider: OnceCell::new(),
        }
    }

    /// Get the shared provider, connecting if this is the first use.
    pub async fn get(&self) -> Result<&OpenSearchProvider, IndexError> {
        if self.provider.initialized() {
            debug!("Using existing search connection");
        }
        self.provider
            .get_or_try_init(|| OpenSearchProvider::connect(&self.config))
            .await
    }

    /// Whether the connection has been established.
    pub fn is_connected(&self) -> bool {
        self.provider.initialized()
    }
}

#[async_trait]
impl CatalogIndexProvider for LazyIndexProvider {
    async fn ensure_index_exists(&self, kind: IndexKind) -> Result<(), IndexError> {
        self.get().await?.ensure_index_exists(kind).await
    }

    async fn bulk_upsert(
        &self,
        kind: IndexKind,
        items: &[CatalogItem],
    ) -> Result<BatchOperationSummary, IndexError> {
        self.get().await?.bulk_upsert(kind, items).await
    }

    async fn ensure_collection_metadata(
        &self,
        descriptor: &CollectionDescriptor,
    ) -> Result<(), IndexError> {
        self.get().await?.ensure_collection_metadata(descriptor).await
    }
}
