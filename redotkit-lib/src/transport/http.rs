//! reqwest-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{check_business_code, RequestHeaders, Transport};
use crate::config::{join_url, RedotConfig};
use crate::{RedotError, Result};

/// HTTP transport posting JSON to the gateway.
///
/// Relative URLs are resolved against the configured base URL. Non-2xx
/// statuses and replies with a non-`SUCCESS` business code are errors.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from the client configuration.
    pub fn new(config: &RedotConfig) -> Result<Self> {
        Self::with_base_url(config.base_url.clone(), config.timeout_secs)
    }

    /// Build a transport for `base_url` with a request timeout.
    pub fn with_base_url(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RedotError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            timeout_secs,
            client,
        })
    }

    /// The base URL relative routes are joined onto.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map HTTP status codes to RedotError.
    fn map_status_error(&self, status: u16, body: &str) -> RedotError {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("msg"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.to_string());

        match status {
            408 | 504 => RedotError::ConnectionTimeout {
                operation: format!("gateway request (HTTP {})", status),
                timeout_ms: self.timeout_secs * 1000,
            },
            500..=599 => {
                RedotError::Transport(format!("gateway server error ({}): {}", status, detail))
            }
            _ => RedotError::Transport(format!("gateway request failed ({}): {}", status, detail)),
        }
    }

    /// Map reqwest errors to RedotError.
    fn map_reqwest_error(&self, e: reqwest::Error) -> RedotError {
        if e.is_timeout() {
            RedotError::ConnectionTimeout {
                operation: "gateway request".to_string(),
                timeout_ms: self.timeout_secs * 1000,
            }
        } else if e.is_connect() {
            RedotError::Transport(format!("connection to {} failed: {}", self.base_url, e))
        } else {
            RedotError::Transport(format!("gateway request failed: {}", e))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, body, headers)))]
    async fn send(&self, url: &str, body: Value, headers: &RequestHeaders) -> Result<Value> {
        let url = join_url(&self.base_url, url);

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(status = status.as_u16(), len = text.len(), "gateway replied");

        if !status.is_success() {
            return Err(self.map_status_error(status.as_u16(), &text));
        }

        let reply: Value = serde_json::from_str(&text)
            .map_err(|e| RedotError::ResponseFormat(format!("reply is not JSON: {}", e)))?;
        check_business_code(reply)
    }
}
