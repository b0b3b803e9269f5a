//! `execute_batch` over HTTP.
//!
//! Features:
//! - Scheme derived from the cluster's `secure` flag
//! - Optional OAuth token
//! - Retry with exponential backoff for transient failures (connection
//!   errors, timeouts, 5xx, 429)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;

use ytbatch_core::config::{proxy_base_url, ClusterConfig};
use ytbatch_core::error::TransportError;
use ytbatch_core::policy::{RetryConfig, RetryPolicy};
use ytbatch_core::request::BatchEnvelope;
use ytbatch_core::response::ClusterError;
use ytbatch_core::transport::BatchTransport;

const EXECUTE_BATCH_PATH: &str = "/api/v3/execute_batch";

/// Configuration for `HttpBatchClient`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub retry: RetryConfig,
    pub request_timeout: Duration,
    /// Sent as `Authorization: OAuth <token>`.
    pub token: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(30),
            token: None,
        }
    }
}

pub struct HttpBatchClient {
    url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    token: Option<String>,
    request_timeout: Duration,
}

impl HttpBatchClient {
    /// Client for a proxy address (`host[:port]` or full base URL).
    pub fn new(proxy: &str, config: HttpClientConfig) -> Result<Self, TransportError> {
        Self::with_base_url(proxy_base_url(proxy, false), config)
    }

    pub fn for_cluster(
        cluster: &ClusterConfig,
        config: HttpClientConfig,
    ) -> Result<Self, TransportError> {
        Self::with_base_url(cluster.base_url(), config)
    }

    pub fn default_for(proxy: &str) -> Result<Self, TransportError> {
        Self::new(proxy, HttpClientConfig::default())
    }

    fn with_base_url(base: String, config: HttpClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: format!("{base}{EXECUTE_BATCH_PATH}"),
            http,
            retry: RetryPolicy::new(config.retry),
            token: config.token,
            request_timeout: config.request_timeout,
        })
    }

    async fn submit_once(&self, envelope: &BatchEnvelope) -> Result<Vec<Value>, TransportError> {
        let mut req = self
            .http
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .json(envelope);
        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("OAuth {token}"));
        }

        let resp = req.send().await.map_err(|e| self.map_reqwest(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_reqwest(e))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), body));
        }
        Ok(serde_json::from_str::<Vec<Value>>(&body)?)
    }

    fn map_reqwest(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout { ms: self.request_timeout.as_millis() as u64 }
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

/// Map a non-success response; transient statuses stay retryable, otherwise
/// a cluster error body is surfaced as such.
fn status_error(status: u16, body: String) -> TransportError {
    if status >= 500 || status == 429 {
        return TransportError::Status { status, body };
    }
    match serde_json::from_str::<ClusterError>(&body) {
        Ok(error) if !error.message.is_empty() => TransportError::Cluster(error),
        _ => TransportError::Status { status, body },
    }
}

#[async_trait]
impl BatchTransport for HttpBatchClient {
    async fn submit_batch(&self, envelope: &BatchEnvelope) -> Result<Vec<Value>, TransportError> {
        if envelope.is_empty() {
            return Ok(vec![]);
        }
        tracing::debug!(url = %self.url, size = envelope.len(), "submitting batch");
        self.retry.run(&self.url, || self.submit_once(envelope)).await
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
