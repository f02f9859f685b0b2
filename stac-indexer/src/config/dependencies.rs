//! Dependency initialization and wiring for the STAC indexer.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use stac_indexer_repository::{CatalogIndexProvider, LazyIndexProvider, OpenSearchConfig};
use stac_indexer_shared::IngestionCheckpoint;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{ConnectionMode, Settings};
use crate::consumer::{HttpFetcher, MessageDispatcher, ReferenceFetcher};
use crate::geometry::CrsRegistry;
use crate::loader::LoaderConfig;
use crate::orchestrator::{ChannelScheduler, ChunkController};
use crate::processor::{HttpTileInfoSource, RecordNormalizer, TransformStream};
use crate::storage::{ObjectStore, S3ObjectStore};
use crate::IndexingError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Chunked ingestion controller for manifest runs.
    pub controller: ChunkController,
    /// Fan-in dispatcher for message batches.
    pub dispatcher: MessageDispatcher,
    /// Checkpoints scheduled by the controller, consumed by the entry point.
    pub continuations: mpsc::UnboundedReceiver<IngestionCheckpoint>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`Settings::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails (only in fail-fast mode)
    pub async fn new() -> Result<Self, IndexingError> {
        Self::from_settings(Settings::from_env()).await
    }

    /// Initialize all dependencies from already-read settings.
    pub async fn from_settings(settings: Settings) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %settings.opensearch.url,
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            chunk_size = settings.controller.chunk_size,
            batch_size = settings.controller.batch_size,
            max_retries = settings.controller.max_retries,
            "Initializing dependencies"
        );

        let provider = Self::connect_to_opensearch(
            settings.opensearch.clone(),
            settings.connection_mode,
            settings.retry_interval,
        )
        .await?;

        info!("OpenSearch connection established");

        let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&settings.s3).await);
        let client = Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .map_err(|e| IndexingError::config(format!("Failed to build HTTP client: {}", e)))?;

        // Processor
        let normalizer = RecordNormalizer::new(
            Arc::new(HttpTileInfoSource::new(client.clone())),
            Arc::new(CrsRegistry::default()),
            settings.endpoints.clone(),
        );
        let transform = TransformStream::new(normalizer, settings.max_consecutive_outages);

        // Orchestrator
        let (scheduler, continuations) = ChannelScheduler::new();
        let controller = ChunkController::new(
            store.clone(),
            provider.clone(),
            transform,
            Arc::new(scheduler),
            settings.controller.clone(),
        );

        // Consumer
        let fetcher = ReferenceFetcher::new(store, HttpFetcher::new(client));
        let dispatcher = MessageDispatcher::new(fetcher, provider)
            .with_concurrency(settings.fanin_concurrency)
            .with_loader_config(LoaderConfig {
                batch_size: settings.controller.batch_size,
            });

        Ok(Self {
            controller,
            dispatcher,
            continuations,
        })
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    ///
    /// The returned provider is shared by the controller and the dispatcher,
    /// so both reuse the connection established here.
    async fn connect_to_opensearch(
        config: OpenSearchConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<Arc<dyn CatalogIndexProvider>, IndexingError> {
        let url = config.url.clone();
        let provider = Arc::new(LazyIndexProvider::new(config));

        loop {
            match provider.get().await {
                Ok(_) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}
