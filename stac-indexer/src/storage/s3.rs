use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use tracing::{debug, info, instrument};

use super::ObjectStore;
use crate::errors::StorageError;

/// Connection settings for S3 or an S3-compatible store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3Settings {
    /// Region override; the SDK default chain is used when unset.
    pub region: Option<String>,
    /// Custom endpoint, e.g. a local MinIO.
    pub endpoint: Option<String>,
    pub force_path_style: bool,
}

/// [`ObjectStore`] backed by the AWS SDK.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client from the SDK's default credential chain and `settings`.
    pub async fn new(settings: &S3Settings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(settings.force_path_style);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            region = ?settings.region,
            endpoint = ?settings.endpoint,
            force_path_style = settings.force_path_style,
            "S3 client initialized"
        );

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(response) => response,
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false)
                    || err.raw_response().map(|r| r.status().as_u16()) == Some(404);
                if missing {
                    return Err(StorageError::not_found(bucket, key));
                }
                return Err(StorageError::transient(format!(
                    "s3://{}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&err)
                )));
            }
        };

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::transient(format!("s3://{}/{}: {}", bucket, key, e)))?
            .into_bytes()
            .to_vec();

        debug!(bytes = data.len(), "Downloaded object");

        Ok(data)
    }
}
