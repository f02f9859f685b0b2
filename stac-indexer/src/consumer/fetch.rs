//! Dereferencing of message references.

use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::errors::DispatchError;
use crate::storage::ObjectStore;

/// Fetches JSON documents over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn fetch_json(&self, url: &str) -> Result<Value, DispatchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DispatchError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::fetch(url, format!("status {}", status)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DispatchError::fetch(url, e))
    }
}

/// Resolves `s3://` references through object storage and `http(s)://`
/// references over HTTP.
#[derive(Clone)]
pub struct ReferenceFetcher {
    store: Arc<dyn ObjectStore>,
    http: HttpFetcher,
}

impl ReferenceFetcher {
    pub fn new(store: Arc<dyn ObjectStore>, http: HttpFetcher) -> Self {
        Self { store, http }
    }

    /// Fetch the JSON document at `href`.
    pub async fn fetch(&self, href: &str) -> Result<Value, DispatchError> {
        let url = Url::parse(href).map_err(|_| DispatchError::UnsupportedSource(href.to_string()))?;

        match url.scheme() {
            "s3" => {
                let (bucket, key) = split_s3_href(href)
                    .ok_or_else(|| DispatchError::malformed(format!("invalid S3 location: {}", href)))?;
                debug!(bucket = bucket, key = key, "Fetching referenced object");
                self.store
                    .get_object_json(bucket, key)
                    .await
                    .map_err(|e| DispatchError::fetch(href, e))
            }
            "http" | "https" => self.http.fetch_json(href).await,
            _ => Err(DispatchError::UnsupportedSource(href.to_string())),
        }
    }
}

/// `s3://bucket/path/to/key` into `("bucket", "path/to/key")`.
fn split_s3_href(href: &str) -> Option<(&str, &str)> {
    let location = href.get(5..)?;
    let (bucket, key) = location.split_once('/')?;
    let key = key.trim_start_matches('/');
    if bucket.is_empty() || key.is_empty() {
        return None;
    }
    Some((bucket, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StorageError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Object store answering every request with the same document.
    struct RecordingStore {
        requested: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
            self.requested
                .lock()
                .unwrap()
                .push((bucket.to_string(), key.to_string()));
            Ok(br#"{"id": "from-s3"}"#.to_vec())
        }
    }

    fn fetcher() -> (ReferenceFetcher, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore {
            requested: Mutex::new(Vec::new()),
        });
        (
            ReferenceFetcher::new(store.clone(), HttpFetcher::default()),
            store,
        )
    }

    #[tokio::test]
    async fn test_s3_reference() {
        let (fetcher, store) = fetcher();

        let value = fetcher.fetch("s3://catalog/items/a b.json").await.unwrap();

        assert_eq!(value["id"], "from-s3");
        assert_eq!(
            *store.requested.lock().unwrap(),
            vec![("catalog".to_string(), "items/a b.json".to_string())]
        );
    }

    #[tokio::test]
    async fn test_http_reference() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/a.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "from-http"})))
            .mount(&server)
            .await;
        let (fetcher, _) = fetcher();

        let value = fetcher
            .fetch(&format!("{}/items/a.json", server.uri()))
            .await
            .unwrap();

        assert_eq!(value["id"], "from-http");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let (fetcher, _) = fetcher();

        let result = fetcher.fetch(&format!("{}/item.json", server.uri())).await;

        assert!(matches!(result, Err(DispatchError::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_slow_reference_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "late"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let http = HttpFetcher::new(client);

        let result = http.fetch_json(&format!("{}/item.json", server.uri())).await;

        assert!(matches!(result, Err(DispatchError::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let (fetcher, _) = fetcher();

        for href in ["ftp://host/item.json", "not a url", "file:///tmp/item.json"] {
            assert_eq!(
                fetcher.fetch(href).await,
                Err(DispatchError::UnsupportedSource(href.to_string()))
            );
        }
    }

    #[test]
    fn test_split_s3_href() {
        assert_eq!(split_s3_href("s3://bucket/key.json"), Some(("bucket", "key.json")));
        assert_eq!(split_s3_href("s3://bucket/"), None);
        assert_eq!(split_s3_href("s3://bucket"), None);
    }
}
