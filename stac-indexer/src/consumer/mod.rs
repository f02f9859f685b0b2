//! Consumer module for the catalog ingest.
//!
//! Receives message batches, resolves them into catalog items and hands the
//! items to the loader.

mod dispatcher;
mod fetch;
mod messages;

pub use dispatcher::{DispatchSummary, MessageDispatcher, DEFAULT_CONCURRENCY};
pub use fetch::{HttpFetcher, ReferenceFetcher};
pub use messages::{IngestEvent, InboundMessage, MessagePayload};
