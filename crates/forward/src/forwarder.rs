//! Webhook delivery.

use crate::config::RelayConfig;
use chartwatch_core::AlertRecord;
use chartwatch_extract::extractor::now_iso8601;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Identifies this relay in outbound payloads.
const RELAY_TAG: &str = concat!("chartwatch v", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
}

/// Outcome of a forward attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Delivered, webhook answered 2xx.
    Sent,
    /// Dropped before any HTTP request was made (relay disabled or
    /// no webhook URL configured).
    Skipped,
}

/// Builds outbound payloads and issues the webhook POST.
///
/// No retries and no explicit timeout beyond the client default; a
/// failed delivery is logged by the caller and the alert is gone.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}

impl Forwarder {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Forward one alert to the configured webhook.
    ///
    /// Returns `Dispatch::Skipped` without touching the network when
    /// the config forbids forwarding. Non-2xx responses are errors
    /// carrying the status code and response body.
    pub async fn forward(
        &self,
        alert: &AlertRecord,
        config: &RelayConfig,
        source_url: &str,
    ) -> Result<Dispatch, ForwardError> {
        if !config.can_forward() {
            debug!("relay disabled or webhook URL empty, dropping alert");
            return Ok(Dispatch::Skipped);
        }

        let mut body = json!({
            "message": alert.message,
            "alert": alert,
            "timestamp": now_iso8601(),
            "source": source_url,
            "relay": RELAY_TAG,
        });
        if let Some(meta) = &alert.socket {
            body["websocket"] = json!(meta);
        }

        let mut request = self.client.post(&config.webhook_url).json(&body);
        if let Some(headers) = config.custom_header_map() {
            for (name, value) in headers {
                request = request.header(name, value);
            }
        }
        if !config.auth_token.is_empty() {
            request = request.bearer_auth(&config.auth_token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ForwardError::Status {
                code: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(Dispatch::Sent)
    }

    /// Manual test-connection action: posts a small test payload with
    /// the same header handling and returns the HTTP status code.
    pub async fn send_test(&self, config: &RelayConfig) -> Result<u16, ForwardError> {
        let body = json!({
            "test": true,
            "message": "chartwatch test connection",
            "timestamp": now_iso8601(),
            "relay": RELAY_TAG,
        });

        let mut request = self.client.post(&config.webhook_url).json(&body);
        if let Some(headers) = config.custom_header_map() {
            for (name, value) in headers {
                request = request.header(name, value);
            }
        }
        if !config.auth_token.is_empty() {
            request = request.bearer_auth(&config.auth_token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ForwardError::Status {
                code: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(status.as_u16())
    }
}
