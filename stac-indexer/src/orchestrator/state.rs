//! Controller state machine.
//!
//! ```text
//! START -> PROCESSING -> CONTINUE -> (next invocation) PROCESSING ...
//!                    \-> RETRY    -> (next invocation) PROCESSING ...
//!                    \-> DONE
//!                    \-> FAILED
//! ```
//!
//! DONE and FAILED are terminal.

use stac_indexer_shared::IngestionCheckpoint;

/// Where an invocation of the controller stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Start,
    Processing,
    Continue,
    Retry,
    Done,
    Failed,
}

impl ControllerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// How processing of the current chunk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkResult {
    Completed,
    Failed { retryable: bool },
}

/// State to enter once the current chunk has been attempted.
///
/// `max_retries` is the number of retries allowed per chunk; a retryable
/// failure with `retry_count == max_retries` is FAILED.
pub fn transition(
    checkpoint: &IngestionCheckpoint,
    result: ChunkResult,
    max_retries: u32,
) -> ControllerState {
    match result {
        ChunkResult::Completed => match checkpoint.last_chunk_index {
            Some(last) if checkpoint.current_chunk_index < last => ControllerState::Continue,
            _ => ControllerState::Done,
        },
        ChunkResult::Failed { retryable: true } if checkpoint.retry_count < max_retries => {
            ControllerState::Retry
        }
        ChunkResult::Failed { .. } => ControllerState::Failed,
    }
}

/// State to enter when an invocation starts.
pub fn on_entry(checkpoint: &IngestionCheckpoint) -> ControllerState {
    if checkpoint.is_complete() {
        ControllerState::Done
    } else if checkpoint.current_chunk_index == 0 && checkpoint.retry_count == 0 {
        ControllerState::Start
    } else {
        ControllerState::Processing
    }
}
