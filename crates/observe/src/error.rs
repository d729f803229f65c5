//! Error types for observer ports.

use thiserror::Error;

/// Errors that can occur while observing a source.
#[derive(Debug, Error)]
pub enum ObserveError {
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    #[error("WebSocket disconnected: {0}")]
    Disconnected(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Channel closed")]
    ChannelClosed,
}

impl From<tokio_tungstenite::tungstenite::Error> for ObserveError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ObserveError::ConnectionFailed(err.to_string())
    }
}

impl From<url::ParseError> for ObserveError {
    fn from(err: url::ParseError) -> Self {
        ObserveError::InvalidUrl(err.to_string())
    }
}

impl ObserveError {
    /// True for errors that a reconnect may clear.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ObserveError::ConnectionFailed(_)
                | ObserveError::Disconnected(_)
                | ObserveError::Timeout(_)
        )
    }
}
