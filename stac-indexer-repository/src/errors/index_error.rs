//! Index error types.
//!
//! This module defines the unified error type for all index operations,
//! covering both backend failures and request validation.

use thiserror::Error;

/// Unified errors from index operations.
///
/// Used by the `CatalogIndexProvider` trait. A bulk request whose individual
/// items fail is *not* an error: those failures are reported per item in the
/// `BatchOperationSummary`. An `IndexError` means the operation as a whole
/// could not be carried out.
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    /// Validation error (e.g., empty document id).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish or use the connection to the search backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to create an index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// The backend rejected a bulk request or one of its documents.
    ///
    /// `status` is the HTTP status reported for it, or 0 when none was given.
    #[error("Bulk request rejected with status {status}: {reason}")]
    BulkRejected { status: u16, reason: String },

    /// Failed to parse a response from the search backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize a document.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },
}

impl IndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a bulk rejection with the status the backend reported.
    pub fn bulk_rejected(status: u16, reason: impl Into<String>) -> Self {
        Self::BulkRejected {
            status,
            reason: reason.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Whether the failure concerns the backend connection rather than the
    /// request itself, so that repeating the request later may succeed.
    ///
    /// A bulk rejection only qualifies when the backend was overloaded (429)
    /// or failing (5xx); any other status rejects the same request again.
    pub fn is_connection_level(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::IndexCreationError(_) => true,
            Self::BulkRejected { status, .. } => *status == 429 || (500..600).contains(status),
            Self::ValidationError(_)
            | Self::ParseError(_)
            | Self::SerializationError(_)
            | Self::BatchSizeExceeded { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_level_classification() {
        assert!(IndexError::connection("refused").is_connection_level());
        assert!(IndexError::bulk_rejected(503, "unavailable").is_connection_level());
        assert!(IndexError::bulk_rejected(429, "es_rejected_execution_exception").is_connection_level());
        assert!(IndexError::index_creation("timeout").is_connection_level());
        assert!(!IndexError::validation("empty id").is_connection_level());
        assert!(!IndexError::batch_size_exceeded(2000, 1000).is_connection_level());
    }

    #[test]
    fn test_deterministic_bulk_rejections_are_not_connection_level() {
        assert!(!IndexError::bulk_rejected(400, "Bad Request").is_connection_level());
        assert!(!IndexError::bulk_rejected(413, "Payload Too Large").is_connection_level());
        assert!(!IndexError::bulk_rejected(0, "mapper_parsing_exception").is_connection_level());
    }
}
