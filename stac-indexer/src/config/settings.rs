//! Settings read from the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use stac_indexer_repository::OpenSearchConfig;
use tracing::warn;

use crate::consumer::DEFAULT_CONCURRENCY;
use crate::loader::DEFAULT_BATCH_SIZE;
use crate::orchestrator::{ControllerConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES};
use crate::processor::sentinel::{DEFAULT_METADATA_BASE_URL, DEFAULT_TILE_BASE_URL};
use crate::processor::{SentinelEndpoints, DEFAULT_MAX_CONSECUTIVE_OUTAGES};
use crate::storage::S3Settings;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default timeout for metadata and reference requests in seconds.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection at a fixed interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("retry").to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Everything the binary needs to wire its components.
#[derive(Debug, Clone)]
pub struct Settings {
    pub opensearch: OpenSearchConfig,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub http_timeout: Duration,
    pub controller: ControllerConfig,
    pub max_consecutive_outages: usize,
    pub fanin_concurrency: usize,
    pub endpoints: SentinelEndpoints,
    pub s3: S3Settings,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL` (fallback `ES_HOST`): OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: Basic-auth credentials (default: none)
    /// - `OPENSEARCH_CONNECTION_MODE`: Connection mode - "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `HTTP_TIMEOUT_SECS`: Timeout for tile metadata and item reference requests (default: 30)
    /// - `INGEST_CHUNK_SIZE`: Manifest rows per invocation (default: 1000)
    /// - `INGEST_BATCH_SIZE`: Items per bulk request (default: 100)
    /// - `INGEST_MAX_RETRIES`: Retries per chunk (default: 3)
    /// - `INGEST_MAX_CONSECUTIVE_OUTAGES`: Enrichment outages tolerated in a row (default: 5)
    /// - `FANIN_CONCURRENCY`: Messages resolved at once (default: 16)
    /// - `SENTINEL_TILE_BASE_URL` / `SENTINEL_METADATA_BASE_URL`: Imagery and metadata hosts
    /// - `AWS_REGION`, `S3_ENDPOINT`, `S3_FORCE_PATH_STYLE`: Object storage settings
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let url = non_empty("OPENSEARCH_URL")
            .or_else(|| non_empty("ES_HOST"))
            .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string());
        let mut opensearch = OpenSearchConfig::new(&url);
        if let (Some(username), Some(password)) =
            (non_empty("OPENSEARCH_USERNAME"), non_empty("OPENSEARCH_PASSWORD"))
        {
            opensearch = opensearch.with_credentials(username, password);
        }

        let connection_mode = ConnectionMode::parse(non_empty("OPENSEARCH_CONNECTION_MODE").as_deref());
        let retry_interval = Duration::from_secs(parse_or(
            &non_empty,
            "OPENSEARCH_RETRY_INTERVAL_SECS",
            DEFAULT_RETRY_INTERVAL_SECS,
        ));

        let http_timeout = Duration::from_secs(
            parse_or(&non_empty, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS).max(1),
        );

        let controller = ControllerConfig {
            chunk_size: parse_or(&non_empty, "INGEST_CHUNK_SIZE", DEFAULT_CHUNK_SIZE).max(1),
            batch_size: parse_or(&non_empty, "INGEST_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1),
            max_retries: parse_or(&non_empty, "INGEST_MAX_RETRIES", DEFAULT_MAX_RETRIES),
        };

        let endpoints = SentinelEndpoints::new(
            non_empty("SENTINEL_TILE_BASE_URL").unwrap_or_else(|| DEFAULT_TILE_BASE_URL.to_string()),
            non_empty("SENTINEL_METADATA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_METADATA_BASE_URL.to_string()),
        );

        let s3 = S3Settings {
            region: non_empty("AWS_REGION"),
            endpoint: non_empty("S3_ENDPOINT"),
            force_path_style: parse_or(&non_empty, "S3_FORCE_PATH_STYLE", false),
        };

        Self {
            opensearch,
            connection_mode,
            retry_interval,
            http_timeout,
            controller,
            max_consecutive_outages: parse_or(
                &non_empty,
                "INGEST_MAX_CONSECUTIVE_OUTAGES",
                DEFAULT_MAX_CONSECUTIVE_OUTAGES,
            )
            .max(1),
            fanin_concurrency: parse_or(&non_empty, "FANIN_CONCURRENCY", DEFAULT_CONCURRENCY).max(1),
            endpoints,
            s3,
        }
    }
}

/// Parse a variable, warning and falling back to `default` on a bad value.
fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(variable = name, value = %raw, "Invalid value, using default");
                default
            }
        },
        None => default,
    }
}
