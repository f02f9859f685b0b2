//! Continuation scheduling.
//!
//! After a chunk the controller hands the next checkpoint to a scheduler,
//! which triggers a new invocation of the file-based entry point with it.

use async_trait::async_trait;
use stac_indexer_shared::IngestionCheckpoint;
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::IngestError;

/// Triggers a new invocation with the given checkpoint.
#[async_trait]
pub trait ContinuationScheduler: Send + Sync {
    async fn schedule(&self, checkpoint: IngestionCheckpoint) -> Result<(), IngestError>;
}

/// In-process scheduler feeding checkpoints into a channel.
///
/// The receiving loop plays the part of the external trigger: every
/// checkpoint it receives is passed back to the same entry point.
#[derive(Debug, Clone)]
pub struct ChannelScheduler {
    sender: mpsc::UnboundedSender<IngestionCheckpoint>,
}

impl ChannelScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<IngestionCheckpoint>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ContinuationScheduler for ChannelScheduler {
    async fn schedule(&self, checkpoint: IngestionCheckpoint) -> Result<(), IngestError> {
        debug!(
            current_chunk_index = checkpoint.current_chunk_index,
            retry_count = checkpoint.retry_count,
            "Scheduling continuation"
        );
        self.sender
            .send(checkpoint)
            .map_err(|_| IngestError::scheduler("continuation channel closed"))
    }
}
