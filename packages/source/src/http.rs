//! HTTP transport adapter over reqwest.

use async_trait::async_trait;
use url::Url;

use reform_core::{Method, RequestConfig, Transport, TransportError, Value};

/// A [`Transport`] that issues real HTTP requests.
///
/// GET requests send params as the query string; POST requests send them as
/// a JSON body. Responses must be JSON and are parsed into a [`Value`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use reform_core::Registry;
/// use reform_source::HttpTransport;
///
/// let mut registry = Registry::new();
/// registry.register_transport("http", Arc::new(HttpTransport::new()));
/// ```
#[derive(Debug, Default, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        HttpTransport { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, config: &RequestConfig) -> Result<Value, TransportError> {
        let url = Url::parse(&config.url).map_err(|e| TransportError::Failed {
            message: format!("invalid url {:?}: {}", config.url, e),
        })?;

        let request = match config.method {
            Method::Get => self.client.get(url).query(&config.params),
            Method::Post => self.client.post(url).json(&config.params),
        };

        let response = request.send().await.map_err(|e| TransportError::Failed {
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| TransportError::InvalidBody {
                    message: e.to_string(),
                })?;
        Ok(body.into())
    }
}
