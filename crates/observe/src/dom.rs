//! DOM snapshot watcher.

use crate::{ObserveError, SignalSource};
use async_trait::async_trait;
use chartwatch_core::{DedupKey, ObserverMessage, PortKind, RawSignal, SeenWindow};
use chartwatch_extract::FragmentScanner;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// How often the latest snapshot is re-scanned, to catch alerts the
/// mutation timing missed.
const RESCAN_INTERVAL: Duration = Duration::from_secs(2);

/// How many processed candidate stamps to keep. This bounds the
/// element-level stamping only; alert-identity dedup happens in the
/// pipeline and stays at its own capacity.
const STAMP_CAPACITY: usize = 4096;

/// A DOM fragment snapshot pushed by the page-side companion.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub html: String,
    pub title: String,
    pub url: String,
}

/// Commands accepted by the watcher.
#[derive(Debug)]
pub enum DomCommand {
    /// New snapshot observed (mutation batch or poll on the page side).
    Snapshot(PageSnapshot),
    /// The page regained focus; re-scan the latest snapshot.
    Focus,
}

/// Observer port that scans DOM fragment snapshots for candidate
/// alert texts.
///
/// Each snapshot is scanned on arrival; the most recent one is
/// re-scanned every two seconds and on focus. Candidates already
/// emitted are stamped (content hash) so the same element text is
/// not delivered twice, which is orthogonal to the pipeline's
/// alert-identity dedup.
pub struct DomWatcher {
    rx: mpsc::Receiver<DomCommand>,
    scanner: FragmentScanner,
    stamps: SeenWindow<DedupKey>,
    latest: Option<PageSnapshot>,
}

impl DomWatcher {
    pub fn new(rx: mpsc::Receiver<DomCommand>) -> Self {
        Self {
            rx,
            scanner: FragmentScanner::new(),
            stamps: SeenWindow::new(STAMP_CAPACITY),
            latest: None,
        }
    }

    async fn run_inner(mut self, tx: mpsc::Sender<ObserverMessage>) -> Result<(), ObserveError> {
        debug!("starting DOM watcher");
        let mut rescan_timer = tokio::time::interval(RESCAN_INTERVAL);
        rescan_timer.tick().await; // first tick is immediate

        loop {
            tokio::select! {
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(DomCommand::Snapshot(snapshot)) => {
                            self.scan(&snapshot, &tx).await?;
                            self.latest = Some(snapshot);
                        }
                        Some(DomCommand::Focus) => {
                            trace!("focus notification, re-scanning latest snapshot");
                            if let Some(snapshot) = self.latest.clone() {
                                self.scan(&snapshot, &tx).await?;
                            }
                        }
                        None => {
                            debug!("DOM watcher input closed");
                            return Ok(());
                        }
                    }
                }
                _ = rescan_timer.tick() => {
                    if let Some(snapshot) = self.latest.clone() {
                        self.scan(&snapshot, &tx).await?;
                    }
                }
            }
        }
    }

    async fn scan(
        &mut self,
        snapshot: &PageSnapshot,
        tx: &mpsc::Sender<ObserverMessage>,
    ) -> Result<(), ObserveError> {
        for text in self.scanner.scan(&snapshot.html) {
            if !self.stamps.admit(DedupKey::content(&text)) {
                continue;
            }
            trace!(candidate = %text, "DOM candidate found");
            let signal = RawSignal::Dom {
                text,
                page_title: snapshot.title.clone(),
                page_url: snapshot.url.clone(),
            };
            if tx.send(signal.into()).await.is_err() {
                return Err(ObserveError::ChannelClosed);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SignalSource for DomWatcher {
    fn port(&self) -> PortKind {
        PortKind::Dom
    }

    async fn run(self: Box<Self>, tx: mpsc::Sender<ObserverMessage>) -> Result<(), ObserveError> {
        (*self).run_inner(tx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(html: &str) -> PageSnapshot {
        PageSnapshot {
            html: html.to_string(),
            title: "XAUUSD chart".to_string(),
            url: "https://chart.example/xauusd".to_string(),
        }
    }

    async fn recv_signal(rx: &mut mpsc::Receiver<ObserverMessage>) -> Option<RawSignal> {
        match tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
            Ok(Some(ObserverMessage::Signal(signal))) => Some(signal),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_snapshot_scanned_once() {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (tx, mut rx) = mpsc::channel(8);
        let watcher: Box<dyn SignalSource> = Box::new(DomWatcher::new(cmd_rx));
        let handle = tokio::spawn(watcher.run(tx));

        let html = r#"<div class="tv-toast">BUY signal triggered for XAUUSD at 2650.50</div>"#;
        cmd_tx
            .send(DomCommand::Snapshot(snapshot(html)))
            .await
            .unwrap();

        let signal = recv_signal(&mut rx).await.expect("candidate expected");
        match signal {
            RawSignal::Dom { text, page_title, .. } => {
                assert_eq!(text, "BUY signal triggered for XAUUSD at 2650.50");
                assert_eq!(page_title, "XAUUSD chart");
            }
            other => panic!("expected DOM signal, got {:?}", other),
        }

        // Same snapshot again: the candidate is stamped, nothing new.
        cmd_tx
            .send(DomCommand::Snapshot(snapshot(html)))
            .await
            .unwrap();
        cmd_tx.send(DomCommand::Focus).await.unwrap();
        assert!(recv_signal(&mut rx).await.is_none());

        drop(cmd_tx);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_new_candidate_after_focus() {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(DomWatcher::new(cmd_rx).run_inner(tx));

        cmd_tx
            .send(DomCommand::Snapshot(snapshot(
                r#"<div role="alert">sell EURUSD now</div>"#,
            )))
            .await
            .unwrap();
        assert!(recv_signal(&mut rx).await.is_some());

        cmd_tx
            .send(DomCommand::Snapshot(snapshot(
                r#"<div role="alert">sell EURUSD now</div><div role="alert">buy GBPUSD now</div>"#,
            )))
            .await
            .unwrap();

        // Only the new element text comes through.
        let signal = recv_signal(&mut rx).await.expect("new candidate expected");
        match signal {
            RawSignal::Dom { text, .. } => assert_eq!(text, "buy GBPUSD now"),
            other => panic!("expected DOM signal, got {:?}", other),
        }
        assert!(recv_signal(&mut rx).await.is_none());

        drop(cmd_tx);
        handle.await.unwrap().unwrap();
    }
}
