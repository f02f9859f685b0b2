//! Integration tests for the message fan-in dispatcher.
//!
//! Events are built the way the queue delivers them and run through the real
//! MessageDispatcher, reference fetcher and loader. Object storage and the
//! index are mocked; HTTP references are served by wiremock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use stac_indexer::consumer::{HttpFetcher, IngestEvent, MessageDispatcher, ReferenceFetcher};
use stac_indexer::errors::{DispatchError, IngestError, StorageError};
use stac_indexer::storage::ObjectStore;
use stac_indexer_repository::{
    BatchOperationResult, BatchOperationSummary, CatalogIndexProvider, IndexError, IndexKind,
};
use stac_indexer_shared::CatalogItem;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// In-memory object store holding JSON documents
struct MemoryStore {
    objects: HashMap<(String, String), Vec<u8>>,
}

impl MemoryStore {
    fn new(objects: &[(&str, &str, Value)]) -> Self {
        Self {
            objects: objects
                .iter()
                .map(|(bucket, key, body)| {
                    ((bucket.to_string(), key.to_string()), body.to_string().into_bytes())
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::not_found(bucket, key))
    }
}

// Mock index provider recording every write
struct MockIndexProvider {
    ensured: Mutex<Vec<IndexKind>>,
    items: Mutex<Vec<CatalogItem>>,
}

impl MockIndexProvider {
    fn new() -> Self {
        Self {
            ensured: Mutex::new(Vec::new()),
            items: Mutex::new(Vec::new()),
        }
    }

    fn item_ids(&self) -> Vec<String> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .map(|item| item.id.clone())
            .collect()
    }
}

#[async_trait]
impl CatalogIndexProvider for MockIndexProvider {
    async fn ensure_index_exists(&self, kind: IndexKind) -> Result<(), IndexError> {
        self.ensured.lock().unwrap().push(kind);
        Ok(())
    }

    async fn bulk_upsert(
        &self,
        _kind: IndexKind,
        items: &[CatalogItem],
    ) -> Result<BatchOperationSummary, IndexError> {
        self.items.lock().unwrap().extend(items.iter().cloned());
        Ok(BatchOperationSummary::from_results(
            items
                .iter()
                .map(|item| BatchOperationResult::ok(item.id.clone()))
                .collect(),
        ))
    }
}

fn item(id: &str) -> Value {
    json!({
        "type": "Feature",
        "id": id,
        "collection": "sentinel-2-l1c",
        "geometry": {"type": "Point", "coordinates": [16.3, 47.8]},
        "properties": {"datetime": "2020-05-01T10:00:00Z"}
    })
}

fn record(message_id: &str, body: &Value) -> Value {
    json!({"messageId": message_id, "body": body.to_string()})
}

fn dispatcher(store: MemoryStore, provider: Arc<MockIndexProvider>) -> MessageDispatcher {
    let fetcher = ReferenceFetcher::new(Arc::new(store), HttpFetcher::default());
    MessageDispatcher::new(fetcher, provider).with_concurrency(4)
}

#[tokio::test]
async fn test_mixed_batch_indexes_only_resolvable_messages() {
    let provider = Arc::new(MockIndexProvider::new());
    let dispatcher = dispatcher(MemoryStore::new(&[]), provider.clone());

    let notification = json!({
        "Type": "Notification",
        "Message": item("S2A_NOTIFIED").to_string()
    });
    let event = IngestEvent::from_value(json!({
        "Records": [
            record("1", &item("S2A_DIRECT")),
            record("2", &notification),
            record("3", &json!({"href": "ftp://example.com/item.json"})),
        ]
    }))
    .unwrap();

    let summary = dispatcher.handle_event(event).await.unwrap();

    assert_eq!(summary.received, 3);
    assert_eq!(summary.resolved, 2);
    assert_eq!(summary.indexed, 2);
    assert_eq!(provider.item_ids(), vec!["S2A_DIRECT", "S2A_NOTIFIED"]);
}

#[tokio::test]
async fn test_references_resolve_from_storage_and_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/S2B_HTTP.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(item("S2B_HTTP")))
        .mount(&server)
        .await;

    let provider = Arc::new(MockIndexProvider::new());
    let store = MemoryStore::new(&[("catalog", "items/S2A_S3.json", item("S2A_S3"))]);
    let dispatcher = dispatcher(store, provider.clone());

    let event = IngestEvent::from_value(json!({
        "Records": [
            record("1", &json!({"href": "s3://catalog/items/S2A_S3.json"})),
            record("2", &json!({"href": format!("{}/items/S2B_HTTP.json", server.uri())})),
            record("3", &json!({"href": "s3://catalog/items/missing.json"})),
        ]
    }))
    .unwrap();

    let summary = dispatcher.handle_event(event).await.unwrap();

    assert_eq!(summary.resolved, 2);
    assert_eq!(provider.item_ids(), vec!["S2A_S3", "S2B_HTTP"]);
}

#[tokio::test]
async fn test_direct_event_with_create_indices() {
    let provider = Arc::new(MockIndexProvider::new());
    let dispatcher = dispatcher(MemoryStore::new(&[]), provider.clone());

    let mut body = item("S2A_DIRECT");
    body["create_indices"] = json!(true);

    let summary = dispatcher
        .handle_event(IngestEvent::from_value(body).unwrap())
        .await
        .unwrap();

    assert_eq!(summary.indexed, 1);
    assert_eq!(
        *provider.ensured.lock().unwrap(),
        vec![IndexKind::Collections, IndexKind::Items]
    );
    let items = provider.items.lock().unwrap();
    assert!(items[0].body.get("create_indices").is_none());
}

#[tokio::test]
async fn test_batch_without_any_resolvable_message_fails() {
    let provider = Arc::new(MockIndexProvider::new());
    let dispatcher = dispatcher(MemoryStore::new(&[]), provider.clone());

    let event = IngestEvent::from_value(json!({
        "Records": [
            record("1", &json!({"no": "id"})),
            {"messageId": "2", "body": "not json"},
        ]
    }))
    .unwrap();

    let err = dispatcher.handle_event(event).await.unwrap_err();

    assert!(matches!(
        err,
        IngestError::DispatchError(DispatchError::NoResolvableItems { total: 2 })
    ));
    assert!(provider.item_ids().is_empty());
}
