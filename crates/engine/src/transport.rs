//! HTTP transport seam.
//!
//! The invoker builds a [`PreparedRequest`] and hands it to an
//! [`HttpTransport`]. Production code uses [`ReqwestTransport`]; tests swap in
//! a recording stub so no network is touched.

use std::time::Instant;

use async_trait::async_trait;
use openinfra_util::redact_sensitive;
use reqwest::{
    Client, Method,
    header::{self, HeaderMap, HeaderValue},
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{ConfigError, EngineConfig, InvocationError};

/// A fully resolved request, ready to send. Requests never carry a body.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    /// Base URL joined with the resolved endpoint template. Not validated
    /// until the transport sends it.
    pub url: String,
    pub headers: HeaderMap,
}

impl PreparedRequest {
    /// Header names and values with credentials masked, suitable for display.
    pub fn redacted_headers(&self) -> Map<String, Value> {
        let mut headers = Map::new();
        for (name, value) in &self.headers {
            let line = format!("{}: {}", name.as_str(), value.to_str().unwrap_or_default());
            let redacted = redact_sensitive(&line);
            let shown = redacted
                .split_once(':')
                .map(|(_, shown)| shown.trim().to_string())
                .unwrap_or_default();
            headers.insert(name.as_str().to_string(), Value::String(shown));
        }
        headers
    }

    /// JSON description used by dry runs.
    pub fn describe(&self) -> Value {
        serde_json::json!({
            "method": self.method.as_str(),
            "url": self.url,
            "headers": Value::Object(self.redacted_headers()),
        })
    }
}

/// Sends prepared requests and returns the raw response body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<Vec<u8>, InvocationError>;
}

/// [`HttpTransport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(default_headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> Result<Vec<u8>, InvocationError> {
        let start = Instant::now();
        let PreparedRequest { method, url, headers } = request;
        debug!(method = %method, url = %url, "http request started");

        let response = self
            .client
            .request(method.clone(), &url)
            .headers(headers)
            .send()
            .await
            .map_err(|error| {
                warn!(
                    method = %method,
                    url = %url,
                    error = %redact_sensitive(&error.to_string()),
                    duration_ms = start.elapsed().as_millis(),
                    "http request failed"
                );
                InvocationError::transport(error)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(InvocationError::transport)?;
        if status.is_success() {
            debug!(
                method = %method,
                url = %url,
                status = %status,
                body_len = body.len(),
                duration_ms = start.elapsed().as_millis(),
                "http request completed"
            );
        } else {
            warn!(
                method = %method,
                url = %url,
                status = %status,
                body_len = body.len(),
                duration_ms = start.elapsed().as_millis(),
                "http request completed with error status"
            );
        }
        Ok(body.to_vec())
    }
}
