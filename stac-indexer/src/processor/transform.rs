//! Transform stream.
//!
//! Two stages over a single pass of raw records:
//!
//! 1. every raw record becomes a [`RecordOutcome`] carrying either the
//!    normalized record or the error that failed it;
//! 2. the aggregator logs failed outcomes, forwards successes and ends the
//!    stream with an error only when the enrichment source looks down.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use stac_indexer_shared::{CatalogRecord, RawTileRecord};
use tracing::{debug, warn};

use crate::errors::{IngestError, NormalizeError};
use crate::processor::normalizer::RecordNormalizer;

/// Default number of consecutive enrichment outages tolerated in one stream.
pub const DEFAULT_MAX_CONSECUTIVE_OUTAGES: usize = 5;

/// The result of normalizing one raw record.
#[derive(Debug)]
pub struct RecordOutcome {
    /// Identity of the raw record (its granule id).
    pub key: String,
    pub result: Result<CatalogRecord, NormalizeError>,
}

/// Counters kept by the aggregator.
#[derive(Debug, Default)]
pub struct TransformStats {
    attempted: AtomicUsize,
    emitted: AtomicUsize,
    failed: AtomicUsize,
    failed_keys: Mutex<Vec<String>>,
}

/// Point-in-time copy of [`TransformStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformSummary {
    pub attempted: usize,
    pub emitted: usize,
    pub failed: usize,
    pub failed_keys: Vec<String>,
}

impl TransformStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_success(&self) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self, key: &str) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut keys) = self.failed_keys.lock() {
            keys.push(key.to_string());
        }
    }

    pub fn summary(&self) -> TransformSummary {
        TransformSummary {
            attempted: self.attempted.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            failed_keys: self
                .failed_keys
                .lock()
                .map(|keys| keys.clone())
                .unwrap_or_default(),
        }
    }
}

/// Stage 1: normalize every record, one at a time, keeping input order.
pub fn normalize_records<S>(
    normalizer: RecordNormalizer,
    records: S,
) -> impl Stream<Item = RecordOutcome> + Send
where
    S: Stream<Item = RawTileRecord> + Send,
{
    records.then(move |raw| {
        let normalizer = normalizer.clone();
        async move {
            let result = normalizer.normalize(&raw).await;
            RecordOutcome {
                key: raw.granule_id,
                result,
            }
        }
    })
}

struct AggregatorState<S> {
    outcomes: S,
    stats: Arc<TransformStats>,
    consecutive_outages: usize,
    max_consecutive_outages: usize,
    exhausted: bool,
}

/// Stage 2: log and drop failures, forward successes.
///
/// After `max_consecutive_outages` outages in a row the stream yields
/// [`IngestError::EnrichmentUnavailable`] and ends.
pub fn aggregate<S>(
    outcomes: S,
    stats: Arc<TransformStats>,
    max_consecutive_outages: usize,
) -> impl Stream<Item = Result<CatalogRecord, IngestError>> + Send
where
    S: Stream<Item = RecordOutcome> + Send + Unpin,
{
    let state = AggregatorState {
        outcomes,
        stats,
        consecutive_outages: 0,
        max_consecutive_outages: max_consecutive_outages.max(1),
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.exhausted {
            return None;
        }

        while let Some(outcome) = state.outcomes.next().await {
            match outcome.result {
                Ok(record) => {
                    state.consecutive_outages = 0;
                    state.stats.record_success();
                    return Some((Ok(record), state));
                }
                Err(e) => {
                    warn!(granule_id = %outcome.key, error = %e, "Failed to normalize record");
                    state.stats.record_failure(&outcome.key);

                    if !e.is_enrichment_outage() {
                        state.consecutive_outages = 0;
                        continue;
                    }

                    state.consecutive_outages += 1;
                    if state.consecutive_outages >= state.max_consecutive_outages {
                        state.exhausted = true;
                        let err = IngestError::EnrichmentUnavailable(format!(
                            "{} consecutive failures, last: {}",
                            state.consecutive_outages, e
                        ));
                        return Some((Err(err), state));
                    }
                }
            }
        }

        let summary = state.stats.summary();
        debug!(
            attempted = summary.attempted,
            emitted = summary.emitted,
            failed = summary.failed,
            "Transform stream finished"
        );
        None
    })
}

/// Single-pass transform of raw records into catalog records.
#[derive(Clone)]
pub struct TransformStream {
    normalizer: RecordNormalizer,
    max_consecutive_outages: usize,
}

impl TransformStream {
    pub fn new(normalizer: RecordNormalizer, max_consecutive_outages: usize) -> Self {
        Self {
            normalizer,
            max_consecutive_outages,
        }
    }

    /// Run both stages over `records`. Counters are written into `stats`.
    pub fn run<S>(
        &self,
        records: S,
        stats: Arc<TransformStats>,
    ) -> BoxStream<'static, Result<CatalogRecord, IngestError>>
    where
        S: Stream<Item = RawTileRecord> + Send + 'static,
    {
        let outcomes = normalize_records(self.normalizer.clone(), records).boxed();
        aggregate(outcomes, stats, self.max_consecutive_outages).boxed()
    }
}
