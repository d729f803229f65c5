//! WebSocket alert-channel payload decoding.
//!
//! The charting platform multiplexes channels over one connection.
//! Alert deliveries look like:
//!
//! ```json
//! {"text": {"channel": "alert", "content": "{\"m\":\"event\",\"p\":{...}}"}}
//! ```
//!
//! where `content` is a JSON string whose `p` body carries the alert
//! fields. Anything that does not match this shape is rejected with
//! `None`; observers pass such frames through untouched.

use chartwatch_core::SocketAlertMeta;
use serde::Deserialize;
use tracing::trace;

#[derive(Debug, Deserialize)]
struct Envelope {
    text: Option<ChannelText>,
}

#[derive(Debug, Deserialize)]
struct ChannelText {
    channel: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlertEvent {
    m: String,
    p: Option<AlertBody>,
}

/// Wire field names as the platform sends them.
#[derive(Debug, Deserialize)]
struct AlertBody {
    id: i64,
    aid: Option<i64>,
    desc: Option<String>,
    sym: Option<String>,
    fire_time: i64,
    bar_time: Option<i64>,
    res: Option<String>,
    snd: Option<bool>,
    popup: Option<bool>,
}

/// A decoded alert-channel delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketAlert {
    /// Alert description as configured on the platform.
    pub message: String,
    /// Instrument symbol, when the payload carried one.
    pub symbol: Option<String>,
    pub meta: SocketAlertMeta,
}

/// Decode a raw text frame into a [`SocketAlert`], or reject it.
///
/// Returns `None` for non-JSON frames, frames on other channels, and
/// alert-channel frames whose inner content is not an `event`.
pub fn decode_socket_payload(payload: &str) -> Option<SocketAlert> {
    let envelope: Envelope = serde_json::from_str(payload).ok()?;
    let text = envelope.text?;
    if text.channel != "alert" {
        return None;
    }

    let content = text.content?;
    let event: AlertEvent = match serde_json::from_str(&content) {
        Ok(event) => event,
        Err(e) => {
            trace!(error = %e, "alert channel content is not valid JSON");
            return None;
        }
    };
    if event.m != "event" {
        return None;
    }
    let body = event.p?;

    Some(SocketAlert {
        message: body.desc.unwrap_or_default(),
        symbol: body.sym,
        meta: SocketAlertMeta {
            alert_id: body.id,
            sequence_id: body.aid,
            fire_time: body.fire_time,
            bar_time: body.bar_time,
            resolution: body.res,
            sound_enabled: body.snd.unwrap_or(false),
            popup_enabled: body.popup.unwrap_or(false),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn alert_frame(inner: &str) -> String {
        let content = serde_json::to_string(inner).unwrap();
        format!(r#"{{"text":{{"channel":"alert","content":{}}}}}"#, content)
    }

    #[test]
    fn test_decode_alert_delivery() {
        let inner = r#"{"m":"event","p":{"id":101,"aid":5,"desc":"BUY XAUUSD at 2650.50","sym":"XAUUSD","fire_time":1700000000,"bar_time":1699999800,"res":"15","snd":true,"popup":false}}"#;
        let frame = alert_frame(inner);

        let alert = decode_socket_payload(&frame).unwrap();
        assert_eq!(alert.message, "BUY XAUUSD at 2650.50");
        assert_eq!(alert.symbol.as_deref(), Some("XAUUSD"));
        assert_eq!(alert.meta.alert_id, 101);
        assert_eq!(alert.meta.sequence_id, Some(5));
        assert_eq!(alert.meta.fire_time, 1_700_000_000);
        assert_eq!(alert.meta.resolution.as_deref(), Some("15"));
        assert!(alert.meta.sound_enabled);
        assert!(!alert.meta.popup_enabled);
    }

    #[test]
    fn test_missing_optional_fields() {
        let inner = r#"{"m":"event","p":{"id":7,"fire_time":1700000500}}"#;
        let alert = decode_socket_payload(&alert_frame(inner)).unwrap();
        assert_eq!(alert.message, "");
        assert_eq!(alert.symbol, None);
        assert_eq!(alert.meta.bar_time, None);
        assert!(!alert.meta.sound_enabled);
    }

    #[test]
    fn test_other_channel_rejected() {
        let frame = r#"{"text":{"channel":"quotes","content":"{}"}}"#;
        assert!(decode_socket_payload(frame).is_none());
    }

    #[test]
    fn test_non_event_rejected() {
        let inner = r#"{"m":"ping","p":{"id":1,"fire_time":0}}"#;
        assert!(decode_socket_payload(&alert_frame(inner)).is_none());
    }

    #[test]
    fn test_non_json_rejected() {
        assert!(decode_socket_payload("not json at all").is_none());
        assert!(decode_socket_payload("").is_none());
        assert!(decode_socket_payload(r#"{"other":"shape"}"#).is_none());
    }

    #[test]
    fn test_malformed_inner_content_rejected() {
        let frame = r#"{"text":{"channel":"alert","content":"not json"}}"#;
        assert!(decode_socket_payload(frame).is_none());
    }
}
