//! Raw signals and channel message types shared between observer
//! ports and the pipeline task.

use crate::SignalOrigin;

/// Observer port identity, used in lifecycle events and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Upstream WebSocket tap.
    Socket,
    /// DOM snapshot watcher.
    Dom,
    /// Local ingest API.
    Ingest,
}

/// A raw observed signal before extraction.
#[derive(Debug, Clone)]
pub enum RawSignal {
    /// Candidate element text found in a DOM fragment snapshot.
    Dom {
        text: String,
        page_title: String,
        page_url: String,
    },
    /// Text frame from a tapped WebSocket connection.
    Socket { url: String, payload: String },
    /// Manually injected test alert.
    Manual { text: String, page_url: String },
}

impl RawSignal {
    pub fn origin(&self) -> SignalOrigin {
        match self {
            RawSignal::Dom { .. } => SignalOrigin::Dom,
            RawSignal::Socket { .. } => SignalOrigin::Websocket,
            RawSignal::Manual { .. } => SignalOrigin::Manual,
        }
    }

    /// URL of the page or connection the signal was observed on.
    pub fn source_url(&self) -> &str {
        match self {
            RawSignal::Dom { page_url, .. } => page_url,
            RawSignal::Socket { url, .. } => url,
            RawSignal::Manual { page_url, .. } => page_url,
        }
    }
}

/// Message sent from observer ports to the pipeline task.
#[derive(Debug, Clone)]
pub enum ObserverMessage {
    Signal(RawSignal),
    Event(ObserverEvent),
}

/// Observer lifecycle events. All of these are non-fatal; the
/// pipeline only logs them.
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    Connected(PortKind),
    Disconnected(PortKind),
    Reconnected(PortKind),
    Error(PortKind, String),
}

impl From<RawSignal> for ObserverMessage {
    fn from(signal: RawSignal) -> Self {
        ObserverMessage::Signal(signal)
    }
}

impl From<ObserverEvent> for ObserverMessage {
    fn from(event: ObserverEvent) -> Self {
        ObserverMessage::Event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_origin() {
        let dom = RawSignal::Dom {
            text: "alert".to_string(),
            page_title: String::new(),
            page_url: "https://example.com/chart".to_string(),
        };
        assert_eq!(dom.origin(), SignalOrigin::Dom);
        assert_eq!(dom.source_url(), "https://example.com/chart");

        let socket = RawSignal::Socket {
            url: "wss://data.example.com/socket.io".to_string(),
            payload: "{}".to_string(),
        };
        assert_eq!(socket.origin(), SignalOrigin::Websocket);
    }

    #[test]
    fn test_message_from() {
        let msg: ObserverMessage = ObserverEvent::Connected(PortKind::Socket).into();
        assert!(matches!(msg, ObserverMessage::Event(_)));
    }
}
