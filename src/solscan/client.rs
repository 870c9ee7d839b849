//! Upstream client for the Solscan Pro API.
//!
//! One tool call maps to exactly one HTTP request. Failures are classified
//! into [`ToolError`] variants here and passed through the dispatcher
//! unchanged. There are no retries.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::solscan::models::{ToolError, UpstreamRequest, UpstreamResult};

/// Longest upstream error body echoed back to callers.
const MAX_ERROR_MESSAGE_LEN: usize = 512;

/// Seam between the dispatcher and the network.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn call(&self, request: UpstreamRequest) -> UpstreamResult;
}

/// Production [`UpstreamClient`] backed by reqwest.
#[derive(Clone)]
pub struct SolscanClient {
    http: Client,
    base_url: String,
    token: SecretString,
    timeout: Duration,
}

impl SolscanClient {
    /// Create a client for `base_url`. `timeout` bounds each call end to end.
    pub fn new(base_url: impl Into<String>, token: SecretString, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("solscan-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api_base.clone(),
            config.api_token.clone(),
            config.upstream_timeout,
        )
    }

    fn transport_error(&self, err: reqwest::Error) -> ToolError {
        let message = if err.is_timeout() {
            format!("Solscan did not respond within {}s", self.timeout.as_secs_f32())
        } else if err.is_connect() {
            format!("could not connect to Solscan: {}", err)
        } else {
            err.to_string()
        };
        ToolError::UpstreamUnavailable {
            message,
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

#[async_trait]
impl UpstreamClient for SolscanClient {
    async fn call(&self, request: UpstreamRequest) -> UpstreamResult {
        let url = request.url(&self.base_url);
        debug!(tool = %request.tool, url = %url, query = ?request.query, "Calling Solscan");

        let token = self.token.expose_secret();
        let response = self
            .http
            .get(&url)
            .query(&request.query)
            .header("token", token.as_str())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        debug!(tool = %request.tool, status = %status, bytes = body.len(), "Solscan responded");

        classify(status, body)
    }
}

fn classify(status: StatusCode, body: String) -> UpstreamResult {
    if status.is_success() {
        // Non-JSON success bodies are still relayed.
        return Ok(serde_json::from_str::<Value>(&body)
            .unwrap_or_else(|_| serde_json::json!({"status": status.as_u16(), "raw": body})));
    }

    let message = error_message(status, &body);
    if status.is_client_error() {
        Err(ToolError::ClientError {
            message,
            status: status.as_u16(),
        })
    } else {
        warn!(status = %status, "Solscan returned a server error");
        Err(ToolError::UpstreamUnavailable {
            message,
            status: Some(status.as_u16()),
        })
    }
}

/// Pulls a readable message out of a Solscan error body, falling back to the
/// raw text and finally the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.pointer("/errors/message")
            .or_else(|| v.get("message"))
            .or_else(|| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    let message = match from_json {
        Some(m) => m,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("upstream error")
            .to_string(),
    };

    if message.len() > MAX_ERROR_MESSAGE_LEN {
        let mut end = MAX_ERROR_MESSAGE_LEN;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &message[..end])
    } else {
        message
    }
}
