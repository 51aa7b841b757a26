//! HTTP transport to the form collector

use super::{Delivery, FormTransport, TransportError};
use crate::config::CollectorConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Posts url-encoded form payloads over HTTP
pub struct HttpTransport {
    http_client: Client,
    timeout_secs: u64,
}

impl HttpTransport {
    /// Create a new transport from collector configuration
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(4)
            .build()
            .map_err(TransportError::Network)?;

        info!(
            "Initialized collector transport with timeout={}s",
            config.timeout_secs
        );

        Ok(Self {
            http_client,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Create transport with custom HTTP client
    pub fn with_http_client(http_client: Client, timeout_secs: u64) -> Self {
        Self {
            http_client,
            timeout_secs,
        }
    }
}

#[async_trait]
impl FormTransport for HttpTransport {
    async fn post_form(
        &self,
        endpoint: &Url,
        payload: &[(String, String)],
    ) -> std::result::Result<Delivery, TransportError> {
        debug!("Posting {} field(s) to {}", payload.len(), endpoint);

        let response = self
            .http_client
            .post(endpoint.clone())
            .form(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.timeout_secs)
                } else {
                    TransportError::Network(e)
                }
            })?;

        // The body is never read; the collector does not grant read access
        Ok(Delivery::Status(response.status().as_u16()))
    }
}
