//! Connection configuration for the OpenSearch index writer.

/// Configuration for connecting to OpenSearch.
#[derive(Debug, Clone)]
pub struct OpenSearchConfig {
    /// Server URL, e.g. `http://localhost:9200`.
    pub url: String,
    /// Basic-auth username, for clusters with fine-grained access control.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
    /// Maximum number of documents allowed in a single bulk request.
    ///
    /// Set to `None` to disable the limit.
    pub max_batch_size: Option<usize>,
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            max_batch_size: Some(1000),
        }
    }
}

impl OpenSearchConfig {
    /// Configuration for the given host.
    ///
    /// A host given without a scheme is assumed to be served over HTTPS.
    pub fn new(host: &str) -> Self {
        let url = if host.starts_with("http") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        Self {
            url,
            ..Default::default()
        }
    }

    /// Use basic authentication.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Override the bulk request limit.
    pub fn with_max_batch_size(mut self, max_batch_size: Option<usize>) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Credentials, when both parts are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }
}
