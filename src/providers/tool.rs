//! JSON tool-call transport shared by the HTTP providers
//!
//! Each backend exposes `POST {base_url}/call` taking `{"tool": .., "parameters": {..}}`
//! and answering with the tool's JSON result, plus `GET {base_url}/health`.

use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ProviderError, ProviderResult};
use crate::config::ProviderEndpoint;

#[derive(Serialize)]
struct ToolCall<'a> {
    tool: &'a str,
    parameters: Value,
}

#[derive(Debug, Clone)]
pub struct ToolClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    service: &'static str,
}

impl ToolClient {
    pub fn new(service: &'static str, endpoint: &ProviderEndpoint) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(endpoint.timeout())
            .user_agent(concat!("tripsmith/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| format!("Failed to build HTTP client for {service}"))?;

        Ok(Self {
            client,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            timeout: endpoint.timeout(),
            service,
        })
    }

    #[must_use]
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Invoke one tool and decode its result
    #[tracing::instrument(name = "tool_call", level = "debug", skip(self, parameters), fields(service = self.service))]
    pub async fn call<T: DeserializeOwned>(&self, tool: &str, parameters: Value) -> ProviderResult<T> {
        let started = Instant::now();
        let url = format!("{}/call", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ToolCall { tool, parameters })
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                service = self.service,
                tool,
                status = status.as_u16(),
                "Tool call rejected: {}",
                truncate(&body, 200)
            );
            return Err(status_error(status, &body));
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(&e))?;
        let decoded = serde_json::from_slice::<T>(&bytes).map_err(|e| {
            ProviderError::InvalidResponse(format!("{} returned malformed {tool} data: {e}", self.service))
        })?;

        debug!(
            service = self.service,
            tool,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool call succeeded"
        );
        Ok(decoded)
    }

    /// `true` when `/health` answers 2xx
    pub async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(service = self.service, "Health check failed: {e}");
                false
            }
        }
    }

    fn transport_error(&self, err: &reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else if err.is_decode() {
            ProviderError::InvalidResponse(format!("{}: {err}", self.service))
        } else {
            ProviderError::Unavailable(format!("{}: {err}", self.service))
        }
    }
}

/// 408, 429 and 5xx are worth retrying; any other rejection is final
fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body, 200));
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        ProviderError::Unavailable(detail)
    } else {
        ProviderError::InvalidResponse(detail)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
