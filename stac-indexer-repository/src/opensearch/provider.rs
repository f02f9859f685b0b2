//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `CatalogIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkOperation, BulkParts, OpenSearch,
};
use serde_json::Value;
use stac_indexer_shared::CatalogItem;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::OpenSearchConfig;
use crate::errors::IndexError;
use crate::interfaces::CatalogIndexProvider;
use crate::opensearch::index_config::{get_index_settings, IndexKind};
use crate::types::{BatchOperationResult, BatchOperationSummary};

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// use stac_indexer_repository::{CatalogIndexProvider, IndexKind, OpenSearchConfig, OpenSearchProvider};
///
/// let provider = OpenSearchProvider::connect(&OpenSearchConfig::default()).await?;
/// provider.ensure_index_exists(IndexKind::Items).await?;
/// // Documents with an existing id replace the previous version
/// let summary = provider.bulk_upsert(IndexKind::Items, &items).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    max_batch_size: Option<usize>,
}

impl OpenSearchProvider {
    /// Create a provider for the configured cluster without contacting it.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(IndexError)` - If the URL is invalid or the transport cannot be built
    pub fn new(config: &OpenSearchConfig) -> Result<Self, IndexError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| IndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some((username, password)) = config.credentials() {
            builder = builder.auth(Credentials::Basic(
                username.to_string(),
                password.to_string(),
            ));
        }
        let transport = builder
            .build()
            .map_err(|e| IndexError::connection(e.to_string()))?;

        Ok(Self {
            client: OpenSearch::new(transport),
            max_batch_size: config.max_batch_size,
        })
    }

    /// Create a provider and verify the cluster answers a health check.
    pub async fn connect(config: &OpenSearchConfig) -> Result<Self, IndexError> {
        let provider = Self::new(config)?;

        let response = provider
            .client
            .cat()
            .health()
            .format("json")
            .send()
            .await
            .map_err(|e| IndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(IndexError::connection(format!(
                "Health check failed with status {}",
                status
            )));
        }

        let health = response.text().await.unwrap_or_default();
        debug!(health = %health, "Cluster health");
        info!(
            url = %config.url,
            authenticated = config.credentials().is_some(),
            "Connected to OpenSearch"
        );

        Ok(provider)
    }

    fn validate_batch_size(&self, size: usize) -> Result<(), IndexError> {
        if let Some(max) = self.max_batch_size {
            if size > max {
                return Err(IndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }
}

/// Map a `_bulk` response body onto the submitted items.
///
/// The response lists one entry per operation, in request order.
pub(crate) fn summarize_bulk_response(
    items: &[CatalogItem],
    body: &Value,
) -> Result<BatchOperationSummary, IndexError> {
    let entries = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| IndexError::parse("Bulk response has no items array"))?;

    if entries.len() != items.len() {
        return Err(IndexError::parse(format!(
            "Bulk response has {} entries for {} documents",
            entries.len(),
            items.len()
        )));
    }

    let results = items
        .iter()
        .zip(entries)
        .map(|(item, entry)| {
            let operation = entry.get("index").unwrap_or(entry);
            let status = operation.get("status").and_then(Value::as_u64).unwrap_or(0);
            if (200..300).contains(&status) {
                BatchOperationResult::ok(item.id.clone())
            } else {
                let reason = operation
                    .get("error")
                    .map(|e| {
                        e.get("reason")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| e.to_string())
                    })
                    .unwrap_or_else(|| format!("status {}", status));
                let status = u16::try_from(status).unwrap_or(0);
                BatchOperationResult::failed(
                    item.id.clone(),
                    IndexError::bulk_rejected(status, reason),
                )
            }
        })
        .collect();

    Ok(BatchOperationSummary::from_results(results))
}

#[async_trait]
impl CatalogIndexProvider for OpenSearchProvider {
    async fn ensure_index_exists(&self, kind: IndexKind) -> Result<(), IndexError> {
        let index = kind.name();

        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| IndexError::connection(e.to_string()))?;

        if response.status_code().is_success() {
            debug!(index = %index, "Index already exists");
            return Ok(());
        }

        info!(index = %index, "Index does not exist, creating");

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(get_index_settings(kind))
            .send()
            .await
            .map_err(|e| IndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            info!(index = %index, "Created index");
            return Ok(());
        }

        let error_body = response.text().await.unwrap_or_default();
        if error_body.contains("resource_already_exists_exception") {
            // Another instance created it first.
            debug!(index = %index, "Index created concurrently");
            return Ok(());
        }

        error!(index = %index, status = %status, body = %error_body, "Index creation failed");
        Err(IndexError::index_creation(format!(
            "Creating {} failed with status {}: {}",
            index, status, error_body
        )))
    }

    async fn bulk_upsert(
        &self,
        kind: IndexKind,
        items: &[CatalogItem],
    ) -> Result<BatchOperationSummary, IndexError> {
        if items.is_empty() {
            return Ok(BatchOperationSummary::default());
        }
        self.validate_batch_size(items.len())?;

        for item in items {
            if item.id.is_empty() {
                return Err(IndexError::validation("Document id is required"));
            }
        }

        let operations: Vec<BulkOperation<Value>> = items
            .iter()
            .map(|item| {
                BulkOperation::index(item.body.clone())
                    .id(item.id.as_str())
                    .into()
            })
            .collect();

        let response = self
            .client
            .bulk(BulkParts::Index(kind.name()))
            .body(operations)
            .send()
            .await
            .map_err(|e| IndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(IndexError::bulk_rejected(status.as_u16(), error_body));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| IndexError::parse(e.to_string()))?;

        let summary = summarize_bulk_response(items, &body)?;
        if summary.failed > 0 {
            warn!(
                index = %kind.name(),
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Bulk upsert completed with failures"
            );
        } else {
            debug!(index = %kind.name(), count = summary.succeeded, "Bulk upsert completed");
        }
        Ok(summary)
    }
}
