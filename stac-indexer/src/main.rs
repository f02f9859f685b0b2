//! STAC Indexer Main Entry Point
//!
//! Reads one trigger payload from the file named on the command line, or from
//! stdin, and runs it to completion. A payload naming a manifest (`bucket` and
//! `key`) runs the chunked ingestion; anything else is a message batch for the
//! fan-in dispatcher.

use dotenv::dotenv;
use serde_json::Value;
use stac_indexer::consumer::IngestEvent;
use stac_indexer::orchestrator::InvocationOutcome;
use stac_indexer::{Dependencies, IndexingError};
use stac_indexer_shared::IngestionCheckpoint;
use std::env;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), IndexingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stac_indexer=info,stac_indexer_repository=info"));

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "stac-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "stac-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

/// Read the trigger payload from `path`, or from stdin when no path is given.
async fn read_payload(path: Option<String>) -> Result<Value, IndexingError> {
    let raw = match path {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| IndexingError::event(format!("{}: {}", path, e)))?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .map_err(|e| IndexingError::event(format!("stdin: {}", e)))?;
            raw
        }
    };

    serde_json::from_str(&raw).map_err(|e| IndexingError::event(e.to_string()))
}

fn is_manifest_trigger(payload: &Value) -> bool {
    payload.get("bucket").is_some() && payload.get("key").is_some()
}

async fn run_manifest(deps: &mut Dependencies, payload: Value) -> Result<(), IndexingError> {
    let checkpoint: IngestionCheckpoint = serde_json::from_value(payload)
        .map_err(|e| IndexingError::event(format!("Invalid ingestion checkpoint: {}", e)))?;

    match deps
        .controller
        .run_to_completion(checkpoint, &mut deps.continuations)
        .await
    {
        InvocationOutcome::Failed { error, .. } => Err(error.into()),
        outcome => {
            info!(checkpoint = ?outcome.checkpoint(), "Manifest ingestion completed");
            Ok(())
        }
    }
}

async fn run_messages(deps: &Dependencies, payload: Value) -> Result<(), IndexingError> {
    let event = IngestEvent::from_value(payload).map_err(|e| IndexingError::event(e.to_string()))?;
    let summary = deps.dispatcher.handle_event(event).await?;

    info!(
        received = summary.received,
        resolved = summary.resolved,
        indexed = summary.indexed,
        index_failures = summary.index_failures,
        "Message batch completed"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting STAC Indexer");

    let payload = read_payload(env::args().nth(1)).await?;

    let mut deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let result = if is_manifest_trigger(&payload) {
        run_manifest(&mut deps, payload).await
    } else {
        run_messages(&deps, payload).await
    };

    match result {
        Ok(()) => {
            info!("STAC indexer completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "STAC indexer failed");
            Err(e)
        }
    }
}
