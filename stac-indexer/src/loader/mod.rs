//! Loader module for the catalog ingest.
//!
//! Writes catalog items into the index in batches.

use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::errors::IngestError;
use stac_indexer_repository::{CatalogIndexProvider, IndexKind};
use stac_indexer_shared::CatalogItem;

/// Default number of items per bulk request.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Configuration for the catalog loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of items to batch before flushing.
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Counts of items written by a loader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    pub written: usize,
    pub failed: usize,
}

/// Loader that writes catalog items into one index.
///
/// The loader is responsible for:
/// - Batching items for efficient bulk indexing
/// - Logging per-item failures without failing the batch
/// - Failing when a bulk request fails as a whole
pub struct CatalogLoader {
    provider: Arc<dyn CatalogIndexProvider>,
    kind: IndexKind,
    config: LoaderConfig,
    pending: Vec<CatalogItem>,
    stats: LoaderStats,
}

impl CatalogLoader {
    /// Create a new loader for the items index.
    pub fn new(provider: Arc<dyn CatalogIndexProvider>) -> Self {
        Self::with_config(provider, LoaderConfig::default())
    }

    /// Create a new loader with custom configuration.
    pub fn with_config(provider: Arc<dyn CatalogIndexProvider>, config: LoaderConfig) -> Self {
        let batch_size = config.batch_size.max(1);
        Self {
            provider,
            kind: IndexKind::Items,
            config: LoaderConfig { batch_size },
            pending: Vec::with_capacity(batch_size),
            stats: LoaderStats::default(),
        }
    }

    /// Add one item, flushing when the batch is full.
    pub async fn push(&mut self, item: CatalogItem) -> Result<(), IngestError> {
        self.pending.push(item);
        if self.pending.len() >= self.config.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Load a set of items.
    ///
    /// Items are batched and flushed whenever the batch size is reached.
    #[instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn load(&mut self, items: Vec<CatalogItem>) -> Result<(), IngestError> {
        for item in items {
            self.push(item).await?;
        }
        Ok(())
    }

    /// Flush all pending items to the index.
    #[instrument(skip(self))]
    pub async fn flush(&mut self) -> Result<(), IngestError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let items: Vec<CatalogItem> = self.pending.drain(..).collect();
        let count = items.len();

        debug!(count = count, index = self.kind.name(), "Flushing items to index");

        match self.provider.bulk_upsert(self.kind, &items).await {
            Ok(summary) => {
                self.stats.written += summary.succeeded;
                self.stats.failed += summary.failed;
                if summary.failed > 0 {
                    warn!(
                        succeeded = summary.succeeded,
                        failed = summary.failed,
                        "Bulk upsert completed with some failures"
                    );
                    for result in summary.failures() {
                        if let Some(ref err) = result.error {
                            error!(id = %result.id, error = %err, "Failed to index item");
                        }
                    }
                } else {
                    debug!(count = summary.succeeded, "Successfully indexed all items");
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, count = count, "Failed to bulk upsert items");
                Err(IngestError::IndexWriteFailed(e))
            }
        }
    }

    /// Items written and failed so far.
    pub fn stats(&self) -> LoaderStats {
        self.stats
    }
}
