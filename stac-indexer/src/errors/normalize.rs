//! Error types for record normalization and enrichment.
use thiserror::Error;

use crate::errors::GeometryError;

/// Failure of the per-tile metadata lookup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnrichmentError {
    /// The metadata document does not exist.
    #[error("Tile metadata not found: {0}")]
    NotFound(String),
    /// The metadata source could not be reached or answered with a server error.
    #[error("Metadata source unavailable: {0}")]
    Network(String),
    /// The metadata source refused the request for this tile.
    #[error("Tile metadata request rejected: {0}")]
    Rejected(String),
    /// The metadata document could not be decoded.
    #[error("Invalid tile metadata: {0}")]
    Decode(String),
}

impl EnrichmentError {
    /// Whether this failure says something about the source rather than the tile.
    pub fn is_outage(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Errors that fail the normalization of a single record.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("Malformed grid code: {0}")]
    MalformedGridCode(String),
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    #[error("Enrichment failed: {0}")]
    EnrichmentFailed(#[from] EnrichmentError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl NormalizeError {
    /// Create a malformed record error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    /// Whether the record failed because the enrichment source is down.
    pub fn is_enrichment_outage(&self) -> bool {
        matches!(self, Self::EnrichmentFailed(e) if e.is_outage())
    }
}
