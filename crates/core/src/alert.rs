//! Normalized alert records.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Symbol used when no heuristic could identify the instrument.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// Alert direction classified from the alert text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertKind {
    Buy,
    Sell,
    Alert,
    Unknown,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Buy => "BUY",
            AlertKind::Sell => "SELL",
            AlertKind::Alert => "ALERT",
            AlertKind::Unknown => "UNKNOWN",
        }
    }
}

/// Where a raw signal was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalOrigin {
    Dom,
    Websocket,
    Manual,
}

/// Metadata carried only by alerts decoded from the platform's
/// WebSocket alert channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketAlertMeta {
    pub alert_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<i64>,
    /// Unix seconds when the alert fired on the platform.
    pub fire_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_time: Option<i64>,
    /// Chart resolution the alert was configured on (e.g. "15", "1D").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    pub sound_enabled: bool,
    pub popup_enabled: bool,
}

/// A normalized alert produced by the extractor.
///
/// Immutable once built; consumed exactly once by the forwarder.
/// `price` stays a string as observed on the page; no numeric
/// precision is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub message: String,
    pub symbol: CompactString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// ISO-8601 capture timestamp.
    pub timestamp: String,
    pub source_kind: SignalOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket: Option<SocketAlertMeta>,
}

impl AlertRecord {
    /// Whether this record originated from the WebSocket observer.
    pub fn is_socket_alert(&self) -> bool {
        self.socket.is_some()
    }
}
