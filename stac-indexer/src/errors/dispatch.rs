//! Error types for the message fan-in dispatcher.
use thiserror::Error;

/// Errors resolving inbound messages into catalog items.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    /// The message body is not a notification, a reference or an item.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),
    /// The reference uses a scheme that cannot be fetched.
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),
    /// Fetching a referenced payload failed.
    #[error("Failed to fetch {href}: {reason}")]
    FetchFailed { href: String, reason: String },
    /// Every message of a non-empty batch failed to resolve.
    #[error("None of the {total} messages resolved to a catalog item")]
    NoResolvableItems { total: usize },
}

impl DispatchError {
    /// Create a malformed message error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedMessage(msg.into())
    }

    /// Create a fetch error.
    pub fn fetch(href: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            href: href.into(),
            reason: reason.to_string(),
        }
    }
}
