//! Index writer trait definition.
//!
//! This module defines the abstract interface for writing catalog documents,
//! allowing for different backend implementations and mock providers in tests.

use async_trait::async_trait;
use stac_indexer_shared::{CatalogItem, CollectionDescriptor};

use crate::errors::IndexError;
use crate::opensearch::IndexKind;
use crate::types::BatchOperationSummary;

/// Abstracts the underlying search index implementation.
///
/// Implementations are shared behind an `Arc` by every pipeline component and
/// must be safe for concurrent use. All writes are keyed upserts, so no
/// locking is needed between concurrent writers.
///
/// # Idempotence
///
/// `bulk_upsert` replaces any existing document with the same id. Writing the
/// same batch twice leaves exactly one document per id, which is what makes
/// retried and resumed ingestion runs safe.
#[async_trait]
pub trait CatalogIndexProvider: Send + Sync {
    /// Ensure the given index exists, creating it with its mapping if needed.
    ///
    /// Losing a creation race against another instance is not an error.
    async fn ensure_index_exists(&self, kind: IndexKind) -> Result<(), IndexError>;

    /// Insert or replace documents, keyed by `CatalogItem::id`.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-item outcomes; failed items do not abort the batch
    /// * `Err(IndexError)` - If the request as a whole fails
    async fn bulk_upsert(
        &self,
        kind: IndexKind,
        items: &[CatalogItem],
    ) -> Result<BatchOperationSummary, IndexError>;

    /// Idempotently store a collection descriptor in the collections index.
    async fn ensure_collection_metadata(
        &self,
        descriptor: &CollectionDescriptor,
    ) -> Result<(), IndexError> {
        self.ensure_index_exists(IndexKind::Collections).await?;

        let body = serde_json::to_value(descriptor)
            .map_err(|e| IndexError::serialization(e.to_string()))?;
        let item = CatalogItem {
            id: descriptor.id.clone(),
            collection: None,
            body,
        };

        let summary = self.bulk_upsert(IndexKind::Collections, &[item]).await?;
        let failure = summary.failures().next().map(|failure| {
            failure
                .error
                .clone()
                .unwrap_or_else(|| IndexError::bulk_rejected(0, "collection upsert failed"))
        });
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
