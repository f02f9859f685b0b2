//! Message fan-in dispatcher.
//!
//! Resolves a batch of inbound messages into catalog items concurrently and
//! writes the resolved items to the index. A message that fails to resolve is
//! logged and dropped; it never fails the rest of the batch.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use stac_indexer_repository::{CatalogIndexProvider, IndexKind};
use stac_indexer_shared::CatalogItem;
use tracing::{info, instrument, warn};

use crate::consumer::fetch::ReferenceFetcher;
use crate::consumer::messages::{IngestEvent, InboundMessage, MessagePayload};
use crate::errors::{DispatchError, IngestError};
use crate::loader::{CatalogLoader, LoaderConfig};

/// Default number of messages resolved at the same time.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Outcome of one dispatched event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub received: usize,
    pub resolved: usize,
    pub indexed: usize,
    pub index_failures: usize,
}

/// Resolves and indexes message batches.
pub struct MessageDispatcher {
    fetcher: ReferenceFetcher,
    provider: Arc<dyn CatalogIndexProvider>,
    concurrency: usize,
    loader_config: LoaderConfig,
}

impl MessageDispatcher {
    pub fn new(fetcher: ReferenceFetcher, provider: Arc<dyn CatalogIndexProvider>) -> Self {
        Self {
            fetcher,
            provider,
            concurrency: DEFAULT_CONCURRENCY,
            loader_config: LoaderConfig::default(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_loader_config(mut self, config: LoaderConfig) -> Self {
        self.loader_config = config;
        self
    }

    /// Resolve every message, keeping input order.
    ///
    /// Fails with [`DispatchError::NoResolvableItems`] only when the batch is
    /// non-empty and no message resolved.
    #[instrument(skip(self, messages), fields(message_count = messages.len()))]
    pub async fn resolve(&self, messages: Vec<InboundMessage>) -> Result<Vec<CatalogItem>, DispatchError> {
        let total = messages.len();

        let outcomes: Vec<(InboundMessage, Result<CatalogItem, DispatchError>)> = stream::iter(messages)
            .map(|message| async move {
                let result = self.resolve_one(&message).await;
                (message, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut items = Vec::with_capacity(total);
        for (message, result) in outcomes {
            match result {
                Ok(item) => items.push(item),
                Err(e) => warn!(
                    message_id = message.label(),
                    error = %e,
                    "Failed to resolve message"
                ),
            }
        }

        if total > 0 && items.is_empty() {
            return Err(DispatchError::NoResolvableItems { total });
        }
        Ok(items)
    }

    async fn resolve_one(&self, message: &InboundMessage) -> Result<CatalogItem, DispatchError> {
        match MessagePayload::classify(&message.body)? {
            MessagePayload::Item(item) => Ok(item),
            MessagePayload::Reference(href) => {
                let body = self.fetcher.fetch(&href).await?;
                CatalogItem::from_value(body).ok_or_else(|| {
                    DispatchError::malformed(format!("{} is not a catalog item", href))
                })
            }
        }
    }

    /// Handle one trigger event of the message path.
    #[instrument(skip(self, event), fields(message_count = event.messages.len()))]
    pub async fn handle_event(&self, event: IngestEvent) -> Result<DispatchSummary, IngestError> {
        if event.create_indices {
            self.provider.ensure_index_exists(IndexKind::Collections).await?;
        }

        let received = event.messages.len();
        let items = self.resolve(event.messages).await?;
        let resolved = items.len();

        if resolved > 0 {
            self.provider.ensure_index_exists(IndexKind::Items).await?;
        }

        let mut loader = CatalogLoader::with_config(self.provider.clone(), self.loader_config.clone());
        loader.load(items).await?;
        loader.flush().await?;
        let stats = loader.stats();

        info!(
            received = received,
            resolved = resolved,
            indexed = stats.written,
            failed = stats.failed,
            "Ingested message batch"
        );

        Ok(DispatchSummary {
            received,
            resolved,
            indexed: stats.written,
            index_failures: stats.failed,
        })
    }
}
