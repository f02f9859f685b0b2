//! Per-tile metadata lookup.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use stac_indexer_shared::SourceGeometry;
use tracing::{debug, instrument};

use crate::errors::EnrichmentError;

/// The fields of a Sentinel-2 `tileInfo.json` document used for normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileInfo {
    pub product_name: String,
    pub tile_geometry: SourceGeometry,
    pub tile_origin: SourceGeometry,
    #[serde(default)]
    pub tile_data_geometry: Option<SourceGeometry>,
}

impl TileInfo {
    /// The data footprint if present, otherwise the full tile geometry.
    pub fn footprint(&self) -> &SourceGeometry {
        self.tile_data_geometry.as_ref().unwrap_or(&self.tile_geometry)
    }
}

/// Source of per-tile metadata.
#[async_trait]
pub trait TileInfoSource: Send + Sync {
    async fn fetch_tile_info(&self, url: &str) -> Result<TileInfo, EnrichmentError>;
}

/// Fetches tile metadata over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpTileInfoSource {
    client: Client,
}

impl HttpTileInfoSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TileInfoSource for HttpTileInfoSource {
    #[instrument(skip(self))]
    async fn fetch_tile_info(&self, url: &str) -> Result<TileInfo, EnrichmentError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EnrichmentError::Network(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(url, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| EnrichmentError::Network(format!("{}: {}", url, e)))?;

        debug!(bytes = body.len(), "Fetched tile info");

        serde_json::from_slice(&body).map_err(|e| EnrichmentError::Decode(format!("{}: {}", url, e)))
    }
}

/// Map an unsuccessful response status to an enrichment failure.
///
/// Only server errors and throttling count against the source. The public
/// bucket answers 403 for keys that do not exist.
fn classify_status(url: &str, status: StatusCode) -> EnrichmentError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN | StatusCode::GONE => {
            EnrichmentError::NotFound(url.to_string())
        }
        status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            EnrichmentError::Network(format!("{} returned {}", url, status))
        }
        status => EnrichmentError::Rejected(format!("{} returned {}", url, status)),
    }
}
