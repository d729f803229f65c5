//! WebSocket tap: observes inbound frames on a platform connection.

use crate::{ObserveError, SignalSource, UrlPredicate};
use async_trait::async_trait;
use chartwatch_core::{ObserverEvent, ObserverMessage, PortKind, RawSignal};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Configuration for a tapped connection.
#[derive(Debug, Clone)]
pub struct TapConfig {
    /// WebSocket URL to connect to.
    pub ws_url: String,
    /// Delay before reconnecting (ms), doubled per attempt.
    pub reconnect_delay_ms: u64,
    /// Ping interval to keep the connection alive (ms).
    pub ping_interval_ms: u64,
    /// Connection timeout (ms).
    pub connect_timeout_ms: u64,
    /// Reconnect when nothing arrives for this long (ms).
    pub stale_timeout_ms: u64,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            ws_url: String::new(),
            reconnect_delay_ms: 1000,
            ping_interval_ms: 30_000,
            connect_timeout_ms: 10_000,
            stale_timeout_ms: 120_000,
        }
    }
}

impl TapConfig {
    pub fn for_url(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            ..Default::default()
        }
    }
}

/// Observer port that owns a WebSocket connection and forwards every
/// inbound text frame whose connection URL passes the predicate.
///
/// Frame content is not inspected here; the extractor decides which
/// frames carry alerts. Reconnects indefinitely with exponential
/// backoff (capped at 5 minutes); the attempt counter resets after 5
/// minutes of stable connection.
pub struct SocketTap {
    config: TapConfig,
    predicate: UrlPredicate,
}

impl SocketTap {
    pub fn new(config: TapConfig, predicate: UrlPredicate) -> Self {
        Self { config, predicate }
    }

    async fn run_inner(self, tx: mpsc::Sender<ObserverMessage>) -> Result<(), ObserveError> {
        if !self.predicate.matches(&self.config.ws_url) {
            debug!(url = %self.config.ws_url, "tap URL outside predicate, not tapping");
            return Ok(());
        }

        let mut reconnect_attempts = 0u32;
        let mut has_connected_once = false;

        loop {
            let connection_start = std::time::Instant::now();
            let is_reconnect = has_connected_once;

            match self.connect_and_read(&tx, is_reconnect).await {
                Ok(()) => {
                    debug!("tap connection closed normally");
                    return Ok(());
                }
                Err(ObserveError::ChannelClosed) => {
                    // Pipeline is gone; nothing left to deliver to.
                    return Err(ObserveError::ChannelClosed);
                }
                Err(e) => {
                    let connection_duration = connection_start.elapsed();
                    has_connected_once = true;

                    if connection_duration > Duration::from_secs(300) {
                        info!(
                            "connection was stable for {:?}, resetting reconnect counter",
                            connection_duration
                        );
                        reconnect_attempts = 0;
                    }

                    reconnect_attempts = reconnect_attempts.saturating_add(1);

                    // Exponential backoff, capped at 5 minutes.
                    let backoff_power = reconnect_attempts.min(8);
                    let delay_ms =
                        (self.config.reconnect_delay_ms * (1 << backoff_power)).min(300_000);

                    warn!(
                        "tap error after {:?}: {}. Reconnecting in {:.1}s (attempt #{})",
                        connection_duration,
                        e,
                        delay_ms as f64 / 1000.0,
                        reconnect_attempts
                    );

                    let _ = tx
                        .send(ObserverEvent::Disconnected(PortKind::Socket).into())
                        .await;

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    async fn connect_and_read(
        &self,
        tx: &mpsc::Sender<ObserverMessage>,
        is_reconnect: bool,
    ) -> Result<(), ObserveError> {
        debug!(url = %self.config.ws_url, "connecting tap");

        let connect = connect_async(&self.config.ws_url);
        let (ws_stream, response) = tokio::time::timeout(
            Duration::from_millis(self.config.connect_timeout_ms),
            connect,
        )
        .await
        .map_err(|_| ObserveError::Timeout("connect".to_string()))??;

        debug!(status = ?response.status(), "tap connected");
        let event = if is_reconnect {
            ObserverEvent::Reconnected(PortKind::Socket)
        } else {
            ObserverEvent::Connected(PortKind::Socket)
        };
        if tx.send(event.into()).await.is_err() {
            return Err(ObserveError::ChannelClosed);
        }

        let (mut write, mut read) = ws_stream.split();

        let ping_interval = Duration::from_millis(self.config.ping_interval_ms);
        let mut ping_timer = tokio::time::interval(ping_interval);
        ping_timer.tick().await; // first tick is immediate

        let stale_timeout = Duration::from_millis(self.config.stale_timeout_ms);
        let mut last_frame_time = std::time::Instant::now();
        let mut frames_seen = 0u64;

        loop {
            if last_frame_time.elapsed() > stale_timeout {
                warn!(
                    "no frames for {:?}, forcing reconnect",
                    last_frame_time.elapsed()
                );
                return Err(ObserveError::Disconnected("stale connection".to_string()));
            }

            tokio::select! {
                msg = read.next() => {
                    last_frame_time = std::time::Instant::now();

                    match msg {
                        Some(Ok(Message::Text(payload))) => {
                            frames_seen += 1;
                            if frames_seen % 1000 == 0 {
                                debug!(frames = frames_seen, "tap frame count");
                            }
                            let signal = RawSignal::Socket {
                                url: self.config.ws_url.clone(),
                                payload,
                            };
                            if tx.send(signal.into()).await.is_err() {
                                return Err(ObserveError::ChannelClosed);
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                return Err(ObserveError::ConnectionFailed(format!(
                                    "PONG send failed: {}",
                                    e
                                )));
                            }
                        }
                        Some(Ok(Message::Pong(_))) => {}
                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "received close frame");
                            return Ok(());
                        }
                        Some(Ok(other)) => {
                            // Binary and fragmented frames never carry the
                            // alert channel; skip them.
                            debug!(kind = ?other, "ignoring non-text frame");
                        }
                        Some(Err(e)) => {
                            return Err(ObserveError::ConnectionFailed(e.to_string()));
                        }
                        None => {
                            return Err(ObserveError::Disconnected("stream ended".to_string()));
                        }
                    }
                }
                _ = ping_timer.tick() => {
                    if let Err(e) = write.send(Message::Ping(vec![])).await {
                        return Err(ObserveError::ConnectionFailed(format!(
                            "PING send failed: {}",
                            e
                        )));
                    }
                }
            }
        }
    }
}

#[async_trait]
impl SignalSource for SocketTap {
    fn port(&self) -> PortKind {
        PortKind::Socket
    }

    async fn run(self: Box<Self>, tx: mpsc::Sender<ObserverMessage>) -> Result<(), ObserveError> {
        (*self).run_inner(tx).await
    }
}
