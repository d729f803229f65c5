//! The observer port contract.

use crate::ObserveError;
use async_trait::async_trait;
use chartwatch_core::{ObserverMessage, PortKind};
use tokio::sync::mpsc;
use url::Url;

/// A source of raw signals.
///
/// The contract is "deliver raw inbound signals matching a
/// predicate"; how a concrete port intercepts them (owning a
/// connection, receiving pushes from a companion script, or a
/// host-provided hook) is its own business.
#[async_trait]
pub trait SignalSource: Send {
    fn port(&self) -> PortKind;

    /// Run the port until its input ends or the pipeline channel
    /// closes. Lifecycle events and signals go out through `tx`.
    async fn run(self: Box<Self>, tx: mpsc::Sender<ObserverMessage>) -> Result<(), ObserveError>;
}

/// Decides which WebSocket connections are worth tapping.
///
/// A URL matches when its host is the configured host or a subdomain
/// of it, and its path contains one of the path fragments (an empty
/// fragment list accepts any path).
#[derive(Debug, Clone)]
pub struct UrlPredicate {
    hosts: Vec<String>,
    path_fragments: Vec<String>,
}

impl Default for UrlPredicate {
    fn default() -> Self {
        Self {
            hosts: vec!["tradingview.com".to_string()],
            path_fragments: vec![
                "socket.io".to_string(),
                "websocket".to_string(),
                "pushstream".to_string(),
            ],
        }
    }
}

impl UrlPredicate {
    pub fn new(hosts: Vec<String>, path_fragments: Vec<String>) -> Self {
        Self {
            hosts,
            path_fragments,
        }
    }

    /// Accept every connection. Useful when the tap URL is already
    /// user-selected.
    pub fn any() -> Self {
        Self {
            hosts: Vec::new(),
            path_fragments: Vec::new(),
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };

        let host_ok = self.hosts.is_empty()
            || self
                .hosts
                .iter()
                .any(|h| host == h || host.ends_with(&format!(".{}", h)));
        if !host_ok {
            return false;
        }

        self.path_fragments.is_empty()
            || self
                .path_fragments
                .iter()
                .any(|frag| parsed.path().contains(frag.as_str()))
    }
}
