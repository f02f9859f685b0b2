//! Orchestrator module for the catalog ingest.
//!
//! The chunk controller drives a manifest through the processor and loader one
//! chunk per invocation, scheduling the next invocation through a
//! [`ContinuationScheduler`].

mod scheduler;
mod state;

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use stac_indexer_repository::{CatalogIndexProvider, IndexKind};
use stac_indexer_shared::IngestionCheckpoint;
use tokio::sync::{mpsc, OnceCell};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::IngestError;
use crate::loader::{CatalogLoader, LoaderConfig, LoaderStats};
use crate::processor::{collection_descriptor, TransformStats, TransformStream, TransformSummary};
use crate::storage::{chunk_count, read_chunk, row_count, ObjectStore};

pub use scheduler::{ChannelScheduler, ContinuationScheduler};
pub use state::{on_entry, transition, ChunkResult, ControllerState};

/// Default number of manifest rows per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default number of retries per chunk.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for the chunk controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Manifest rows per chunk.
    pub chunk_size: usize,
    /// Items per bulk request.
    pub batch_size: usize,
    /// Retries allowed per chunk before the run fails.
    pub max_retries: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            batch_size: crate::loader::DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// What one invocation ended with.
#[derive(Debug)]
pub enum InvocationOutcome {
    /// The next chunk was scheduled with this checkpoint.
    Continue(IngestionCheckpoint),
    /// The current chunk was scheduled again with this checkpoint.
    Retry(IngestionCheckpoint),
    /// Every chunk has been processed.
    Done(IngestionCheckpoint),
    /// The run stopped; `checkpoint` is where it stood.
    Failed {
        checkpoint: IngestionCheckpoint,
        error: IngestError,
    },
}

impl InvocationOutcome {
    pub fn state(&self) -> ControllerState {
        match self {
            Self::Continue(_) => ControllerState::Continue,
            Self::Retry(_) => ControllerState::Retry,
            Self::Done(_) => ControllerState::Done,
            Self::Failed { .. } => ControllerState::Failed,
        }
    }

    pub fn checkpoint(&self) -> &IngestionCheckpoint {
        match self {
            Self::Continue(checkpoint) | Self::Retry(checkpoint) | Self::Done(checkpoint) => checkpoint,
            Self::Failed { checkpoint, .. } => checkpoint,
        }
    }
}

/// What processing one chunk produced.
#[derive(Debug, Clone, Default)]
pub struct ChunkReport {
    pub transform: TransformSummary,
    pub loader: LoaderStats,
    /// Manifest rows that could not be decoded.
    pub skipped_rows: usize,
}

/// Chunked ingestion controller.
///
/// The controller:
/// - Sizes the manifest on the first invocation of a run
/// - Seeds the collection metadata once per process
/// - Streams one chunk through the transform and the loader
/// - Schedules the continuation, a retry, or stops
pub struct ChunkController {
    store: Arc<dyn ObjectStore>,
    provider: Arc<dyn CatalogIndexProvider>,
    transform: TransformStream,
    scheduler: Arc<dyn ContinuationScheduler>,
    config: ControllerConfig,
    seeded: OnceCell<()>,
}

impl ChunkController {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        provider: Arc<dyn CatalogIndexProvider>,
        transform: TransformStream,
        scheduler: Arc<dyn ContinuationScheduler>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            store,
            provider,
            transform,
            scheduler,
            config,
            seeded: OnceCell::new(),
        }
    }

    /// Handle one invocation.
    #[instrument(skip(self, checkpoint), fields(
        bucket = %checkpoint.bucket,
        key = %checkpoint.key,
        chunk = checkpoint.current_chunk_index,
        retry = checkpoint.retry_count,
    ))]
    pub async fn handle(&self, mut checkpoint: IngestionCheckpoint) -> InvocationOutcome {
        if checkpoint.invocation_reference.is_none() {
            checkpoint.invocation_reference = Some(Uuid::new_v4().to_string());
        }

        let entry = on_entry(&checkpoint);
        info!(state = ?entry, checkpoint = ?checkpoint, "Invocation started");
        if entry == ControllerState::Done {
            return InvocationOutcome::Done(checkpoint);
        }

        debug!(state = ?ControllerState::Processing, "Processing chunk");
        let result = self.process_chunk(&mut checkpoint).await;

        let chunk_result = match &result {
            Ok(_) => ChunkResult::Completed,
            Err(e) => ChunkResult::Failed {
                retryable: e.is_retryable(),
            },
        };
        let next = transition(&checkpoint, chunk_result, self.config.max_retries);

        match (next, result) {
            (ControllerState::Continue, Ok(report)) => {
                info!(
                    emitted = report.transform.emitted,
                    failed = report.transform.failed,
                    written = report.loader.written,
                    skipped_rows = report.skipped_rows,
                    "Chunk completed"
                );
                self.schedule(checkpoint.advanced(), InvocationOutcome::Continue).await
            }
            (ControllerState::Done, Ok(report)) => {
                info!(
                    emitted = report.transform.emitted,
                    failed = report.transform.failed,
                    written = report.loader.written,
                    skipped_rows = report.skipped_rows,
                    "Final chunk completed"
                );
                InvocationOutcome::Done(checkpoint)
            }
            (ControllerState::Retry, Err(e)) => {
                warn!(error = %e, "Chunk failed, scheduling retry");
                self.schedule(checkpoint.retried(), InvocationOutcome::Retry).await
            }
            (_, Err(e)) => {
                let error = if e.is_retryable() {
                    IngestError::RetryCeilingExceeded {
                        chunk_index: checkpoint.current_chunk_index,
                        retries: checkpoint.retry_count,
                        last_error: e.to_string(),
                    }
                } else {
                    e
                };
                self.fail(checkpoint, error)
            }
            (state, Ok(_)) => self.fail(
                checkpoint,
                IngestError::scheduler(format!("unexpected transition to {:?}", state)),
            ),
        }
    }

    /// Handle `first` and every checkpoint scheduled from it until a terminal
    /// state is reached.
    pub async fn run_to_completion(
        &self,
        first: IngestionCheckpoint,
        receiver: &mut mpsc::UnboundedReceiver<IngestionCheckpoint>,
    ) -> InvocationOutcome {
        let mut outcome = self.handle(first).await;
        while !outcome.state().is_terminal() {
            let Some(next) = receiver.recv().await else {
                let checkpoint = outcome.checkpoint().clone();
                return self.fail(checkpoint, IngestError::scheduler("continuation channel closed"));
            };
            outcome = self.handle(next).await;
        }
        outcome
    }

    async fn schedule(
        &self,
        next: IngestionCheckpoint,
        outcome: fn(IngestionCheckpoint) -> InvocationOutcome,
    ) -> InvocationOutcome {
        match self.scheduler.schedule(next.clone()).await {
            Ok(()) => outcome(next),
            Err(e) => self.fail(next, e),
        }
    }

    fn fail(&self, checkpoint: IngestionCheckpoint, error: IngestError) -> InvocationOutcome {
        error!(
            state = ?ControllerState::Failed,
            error = %error,
            checkpoint = ?checkpoint,
            "Ingestion run failed"
        );
        InvocationOutcome::Failed { checkpoint, error }
    }

    /// Seed collection metadata and the items index once per process.
    ///
    /// A failed attempt is not remembered; the next chunk tries again.
    async fn seed(&self) -> Result<(), IngestError> {
        self.seeded
            .get_or_try_init(|| async {
                let descriptor = collection_descriptor();
                self.provider.ensure_collection_metadata(&descriptor).await?;
                self.provider.ensure_index_exists(IndexKind::Items).await?;
                info!(collection = %descriptor.id, "Collection metadata seeded");
                Ok::<(), IngestError>(())
            })
            .await?;
        Ok(())
    }

    async fn process_chunk(&self, checkpoint: &mut IngestionCheckpoint) -> Result<ChunkReport, IngestError> {
        let manifest = self
            .store
            .get_object(&checkpoint.bucket, &checkpoint.key)
            .await?;

        if checkpoint.last_chunk_index.is_none() {
            let rows = row_count(&manifest)?;
            let last = chunk_count(rows, self.config.chunk_size).saturating_sub(1);
            let last = u32::try_from(last)
                .map_err(|_| IngestError::manifest(format!("{} rows is too many chunks", rows)))?;
            info!(rows = rows, last_chunk_index = last, "Manifest sized");
            checkpoint.last_chunk_index = Some(last);
        }

        self.seed().await?;

        let chunk = read_chunk(&manifest, checkpoint.current_chunk_index, self.config.chunk_size)?;
        debug!(records = chunk.records.len(), skipped = chunk.skipped, "Chunk read");

        let stats = Arc::new(TransformStats::new());
        let mut records = self.transform.run(stream::iter(chunk.records), stats.clone());
        let mut loader = CatalogLoader::with_config(
            self.provider.clone(),
            LoaderConfig {
                batch_size: self.config.batch_size,
            },
        );

        while let Some(record) = records.next().await {
            let record = record?;
            match record.to_item() {
                Ok(item) => loader.push(item).await?,
                Err(e) => warn!(id = %record.id, error = %e, "Failed to serialize record"),
            }
        }
        loader.flush().await?;

        Ok(ChunkReport {
            transform: stats.summary(),
            loader: loader.stats(),
            skipped_rows: chunk.skipped,
        })
    }
}
