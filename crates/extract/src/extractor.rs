//! Text-to-record extraction.

use crate::keywords::classify;
use crate::socket::decode_socket_payload;
use chartwatch_core::{AlertRecord, RawSignal, SignalOrigin, UNKNOWN_SYMBOL};
use chrono::{SecondsFormat, Utc};
use compact_str::CompactString;
use regex::Regex;
use tracing::trace;

/// Minimum characters of meaningful (trimmed) text for an input to
/// count as an alert at all.
const MIN_ALERT_TEXT_CHARS: usize = 3;

/// Heuristic extractor holding the compiled patterns.
///
/// Construct once and reuse; extraction itself is pure and cheap.
pub struct Extractor {
    /// Instrument pair token, e.g. "XAUUSD", "BTC/USD", "FX:EURUSD".
    symbol_pair: Regex,
    /// Fallback: first uppercase run in the page title.
    title_symbol: Regex,
    /// Numeric price token.
    price_token: Regex,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            symbol_pair: Regex::new(r"([A-Z]{2,10}[/:]?[A-Z]{2,10})").unwrap(),
            title_symbol: Regex::new(r"([A-Z]{2,})").unwrap(),
            price_token: Regex::new(r"[\d,]+\.?\d*").unwrap(),
        }
    }

    /// Extract a normalized record from any raw signal, or reject it.
    pub fn extract(&self, signal: &RawSignal) -> Option<AlertRecord> {
        match signal {
            RawSignal::Dom {
                text, page_title, ..
            } => self.extract_text(text, SignalOrigin::Dom, page_title),
            RawSignal::Socket { payload, .. } => self.extract_socket(payload),
            RawSignal::Manual { text, .. } => {
                self.extract_text(text, SignalOrigin::Manual, "")
            }
        }
    }

    /// Extract from plain alert text. Returns `None` when the input
    /// has fewer than 3 characters of meaningful text.
    pub fn extract_text(
        &self,
        text: &str,
        origin: SignalOrigin,
        page_title: &str,
    ) -> Option<AlertRecord> {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_ALERT_TEXT_CHARS {
            trace!(len = trimmed.len(), "extraction miss: text too short");
            return None;
        }

        Some(AlertRecord {
            message: trimmed.to_string(),
            symbol: self.extract_symbol(trimmed, page_title),
            price: self.extract_price(trimmed),
            kind: classify(trimmed),
            timestamp: now_iso8601(),
            source_kind: origin,
            socket: None,
        })
    }

    /// Decode a WebSocket payload and, when it carries the alert
    /// channel shape, build a record from it. Non-alert payloads are
    /// rejected with `None`.
    pub fn extract_socket(&self, payload: &str) -> Option<AlertRecord> {
        let decoded = decode_socket_payload(payload)?;

        let message = decoded.message.trim().to_string();
        if message.chars().count() < MIN_ALERT_TEXT_CHARS {
            trace!("extraction miss: alert description too short");
            return None;
        }

        // Prefer the symbol from the alert payload; fall back to the
        // pair heuristic over the description.
        let symbol = match decoded.symbol {
            Some(sym) if !sym.is_empty() => CompactString::new(&sym),
            _ => self.extract_symbol(&message, ""),
        };

        Some(AlertRecord {
            price: self.extract_price(&message),
            kind: classify(&message),
            symbol,
            timestamp: now_iso8601(),
            source_kind: SignalOrigin::Websocket,
            socket: Some(decoded.meta),
            message,
        })
    }

    /// First pair-pattern match in the text, else the first uppercase
    /// run in the page title, else `UNKNOWN`.
    fn extract_symbol(&self, text: &str, page_title: &str) -> CompactString {
        if let Some(m) = self.symbol_pair.find(text) {
            return CompactString::new(m.as_str());
        }
        if let Some(m) = self.title_symbol.find(page_title) {
            return CompactString::new(m.as_str());
        }
        CompactString::new(UNKNOWN_SYMBOL)
    }

    /// First numeric token, skipping tokens that contain no digit and
    /// tokens glued to a `key=value` specifier (position sizes and the
    /// like are not prices).
    fn extract_price(&self, text: &str) -> Option<String> {
        for m in self.price_token.find_iter(text) {
            if !m.as_str().bytes().any(|b| b.is_ascii_digit()) {
                continue;
            }
            if text[..m.start()].ends_with('=') {
                continue;
            }
            return Some(m.as_str().to_string());
        }
        None
    }
}

/// Capture timestamp in the ISO-8601 form the webhook receivers
/// expect (millisecond precision, Z suffix).
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
