//! Relay configuration and usage statistics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// User relay configuration, persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    /// Webhook endpoint receiving forwarded alerts.
    pub webhook_url: String,
    /// Bearer token sent as `Authorization` header; empty = none.
    pub auth_token: String,
    /// Raw JSON text mapping header name to value; empty = none.
    /// Malformed JSON is ignored at forward time (soft-fail).
    pub custom_headers: String,
    /// Whether alerts are forwarded at all. Observers keep running
    /// when disabled; extracted alerts are dropped before forwarding.
    pub enabled: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:5000/webhook".to_string(),
            auth_token: String::new(),
            custom_headers: String::new(),
            enabled: true,
        }
    }
}

/// Validation errors surfaced to the configuration caller on save.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("webhook URL must not be empty")]
    EmptyWebhookUrl,
    #[error("webhook URL is not a valid URL: {0}")]
    InvalidWebhookUrl(String),
    #[error("custom headers must be a JSON object of string values: {0}")]
    InvalidCustomHeaders(String),
}

impl RelayConfig {
    /// Whether a forward attempt may be made at all.
    pub fn can_forward(&self) -> bool {
        self.enabled && !self.webhook_url.is_empty()
    }

    /// Parse the custom header JSON. Malformed text yields `None`
    /// with a warning; forwarding proceeds without the headers.
    pub fn custom_header_map(&self) -> Option<HashMap<String, String>> {
        if self.custom_headers.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<HashMap<String, String>>(&self.custom_headers) {
            Ok(map) => Some(map),
            Err(e) => {
                warn!(error = %e, "invalid custom headers JSON, forwarding without them");
                None
            }
        }
    }

    /// Strict validation for the configuration save path. Forwarding
    /// itself never rejects a stored config; only saves do.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhook_url.trim().is_empty() {
            return Err(ConfigError::EmptyWebhookUrl);
        }
        if let Err(e) = url::Url::parse(&self.webhook_url) {
            return Err(ConfigError::InvalidWebhookUrl(e.to_string()));
        }
        if !self.custom_headers.trim().is_empty() {
            if let Err(e) = serde_json::from_str::<HashMap<String, String>>(&self.custom_headers) {
                return Err(ConfigError::InvalidCustomHeaders(e.to_string()));
            }
        }
        Ok(())
    }
}

/// Usage statistics, persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStats {
    /// Alerts successfully delivered to the webhook.
    pub total_alerts: i64,
    /// ISO-8601 time of the last successful delivery.
    pub last_alert: Option<String>,
}
