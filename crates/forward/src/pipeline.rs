//! The alert pipeline: extraction, duplicate suppression, gating,
//! and delivery.

use crate::{Dispatch, Forwarder, Store};
use chartwatch_core::{DedupKey, ObserverEvent, ObserverMessage, RawSignal, SeenWindow};
use chartwatch_extract::extractor::now_iso8601;
use chartwatch_extract::Extractor;
use tracing::{debug, info, warn};

/// Capacity of the alert-identity dedup window.
const DEDUP_CAPACITY: usize = 100;

/// Owns the per-run pipeline state.
///
/// Exactly one pipeline exists per daemon run; it consumes observer
/// messages from a single channel, so no locking is needed around
/// the dedup window. Nothing here is fatal: every failure degrades
/// to "alert not forwarded this time".
pub struct Pipeline {
    store: Store,
    forwarder: Forwarder,
    extractor: Extractor,
    dedup: SeenWindow<DedupKey>,
}

impl Pipeline {
    pub fn new(store: Store, forwarder: Forwarder) -> Self {
        Self {
            store,
            forwarder,
            extractor: Extractor::new(),
            dedup: SeenWindow::new(DEDUP_CAPACITY),
        }
    }

    /// Handle one observer message.
    pub async fn handle(&mut self, msg: ObserverMessage) {
        match msg {
            ObserverMessage::Event(event) => self.handle_event(event),
            ObserverMessage::Signal(signal) => self.process(signal).await,
        }
    }

    fn handle_event(&self, event: ObserverEvent) {
        match event {
            ObserverEvent::Connected(port) => info!(?port, "observer connected"),
            ObserverEvent::Reconnected(port) => info!(?port, "observer reconnected"),
            ObserverEvent::Disconnected(port) => warn!(?port, "observer disconnected"),
            ObserverEvent::Error(port, e) => warn!(?port, error = %e, "observer error"),
        }
    }

    async fn process(&mut self, signal: RawSignal) {
        let source_url = signal.source_url().to_string();

        let Some(alert) = self.extractor.extract(&signal) else {
            debug!(origin = ?signal.origin(), "extraction miss, dropping signal");
            return;
        };

        let key = DedupKey::for_alert(&alert);
        if !self.dedup.admit(key) {
            debug!(symbol = %alert.symbol, "duplicate alert suppressed");
            return;
        }

        // Config is re-read per alert so UI changes apply immediately.
        let config = match self.store.load_config().await {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "failed to load relay config, dropping alert");
                return;
            }
        };
        if !config.can_forward() {
            debug!(symbol = %alert.symbol, "relay disabled, dropping alert");
            return;
        }

        match self.forwarder.forward(&alert, &config, &source_url).await {
            Ok(Dispatch::Sent) => {
                if let Err(e) = self.store.record_forwarded(&now_iso8601()).await {
                    warn!(error = %e, "failed to record delivery stats");
                }
                info!(
                    symbol = %alert.symbol,
                    kind = alert.kind.as_str(),
                    origin = ?alert.source_kind,
                    "alert forwarded"
                );
            }
            Ok(Dispatch::Skipped) => {}
            Err(e) => {
                // No retry, no persistence of the missed alert.
                warn!(error = %e, symbol = %alert.symbol, "webhook delivery failed");
            }
        }
    }
}
