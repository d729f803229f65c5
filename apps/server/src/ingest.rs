//! Local ingest HTTP API.
//!
//! The Rust-side rendition of the page/background message passing: a
//! thin page-side companion pushes DOM snapshots, raw socket frames,
//! and manual test alerts here, and the configuration UI reads and
//! writes the relay settings.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chartwatch_core::RawSignal;
use chartwatch_forward::{ForwardError, Forwarder, RelayConfig, Store};
use chartwatch_observe::{DomCommand, PageSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

/// Message type accepted on `/signal`.
const ALERT_MESSAGE_TYPE: &str = "TRADINGVIEW_ALERT";

/// Shared state for the ingest handlers.
pub struct IngestState {
    pub signal_tx: mpsc::Sender<chartwatch_core::ObserverMessage>,
    pub dom_tx: mpsc::Sender<DomCommand>,
    pub store: Store,
    pub forwarder: Arc<Forwarder>,
}

/// Inter-context message pushed by the page-side companion.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    /// "dom" (default), "websocket", or "manual".
    pub source: Option<String>,
    /// DOM fragment for source "dom".
    pub html: Option<String>,
    /// Page title accompanying a DOM fragment.
    pub title: Option<String>,
    /// Raw frame payload ("websocket") or alert text ("manual").
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Build the ingest router.
pub fn create_router(state: Arc<IngestState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/signal", post(signal_handler))
        .route("/focus", post(focus_handler))
        .route("/config", get(get_config_handler).post(save_config_handler))
        .route("/stats", get(stats_handler))
        .route("/test", post(test_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve the ingest API in the background.
pub async fn start_ingest_server(
    state: Arc<IngestState>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    info!("ingest API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("ingest server error: {}", e);
        }
    });

    Ok(())
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn signal_handler(
    State(state): State<Arc<IngestState>>,
    Json(msg): Json<IngestMessage>,
) -> Json<IngestResponse> {
    if msg.kind != ALERT_MESSAGE_TYPE {
        debug!(kind = %msg.kind, "unsupported ingest message type");
        return Json(IngestResponse::err("unsupported message type"));
    }

    let source = msg.source.as_deref().unwrap_or("dom");
    let delivered = match source {
        "dom" => {
            let Some(html) = msg.html else {
                return Json(IngestResponse::err("dom signal requires html"));
            };
            let snapshot = PageSnapshot {
                html,
                title: msg.title.unwrap_or_default(),
                url: msg.url,
            };
            state.dom_tx.send(DomCommand::Snapshot(snapshot)).await.is_ok()
        }
        "websocket" => {
            let Some(payload) = msg.text else {
                return Json(IngestResponse::err("websocket signal requires text"));
            };
            let signal = RawSignal::Socket {
                url: msg.url,
                payload,
            };
            state.signal_tx.send(signal.into()).await.is_ok()
        }
        "manual" => {
            let Some(text) = msg.text else {
                return Json(IngestResponse::err("manual signal requires text"));
            };
            let signal = RawSignal::Manual {
                text,
                page_url: msg.url,
            };
            state.signal_tx.send(signal.into()).await.is_ok()
        }
        other => {
            return Json(IngestResponse::err(format!(
                "unknown signal source: {}",
                other
            )));
        }
    };

    if delivered {
        Json(IngestResponse::ok("signal accepted"))
    } else {
        Json(IngestResponse::err("pipeline unavailable"))
    }
}

async fn focus_handler(State(state): State<Arc<IngestState>>) -> Json<IngestResponse> {
    if state.dom_tx.send(DomCommand::Focus).await.is_ok() {
        Json(IngestResponse::ok("focus noted"))
    } else {
        Json(IngestResponse::err("watcher unavailable"))
    }
}

async fn get_config_handler(State(state): State<Arc<IngestState>>) -> impl IntoResponse {
    match state.store.load_config().await {
        Ok(config) => (StatusCode::OK, Json(serde_json::json!(config))),
        Err(e) => {
            warn!(error = %e, "failed to load config");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!(IngestResponse::err(e.to_string()))),
            )
        }
    }
}

async fn save_config_handler(
    State(state): State<Arc<IngestState>>,
    Json(config): Json<RelayConfig>,
) -> impl IntoResponse {
    if let Err(e) = config.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(IngestResponse::err(e.to_string())),
        );
    }

    match state.store.save_config(&config).await {
        Ok(()) => (StatusCode::OK, Json(IngestResponse::ok("configuration saved"))),
        Err(e) => {
            // Storage failure surfaces only here, to the save caller.
            warn!(error = %e, "failed to save config");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(IngestResponse::err(format!("failed to save: {}", e))),
            )
        }
    }
}

async fn stats_handler(State(state): State<Arc<IngestState>>) -> impl IntoResponse {
    match state.store.load_stats().await {
        Ok(stats) => (StatusCode::OK, Json(serde_json::json!(stats))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!(IngestResponse::err(e.to_string()))),
        ),
    }
}

async fn test_handler(State(state): State<Arc<IngestState>>) -> Json<IngestResponse> {
    let config = match state.store.load_config().await {
        Ok(config) => config,
        Err(e) => return Json(IngestResponse::err(e.to_string())),
    };

    match state.forwarder.send_test(&config).await {
        Ok(status) => Json(IngestResponse::ok(format!("webhook answered HTTP {}", status))),
        Err(ForwardError::Status { code, .. }) => {
            Json(IngestResponse::err(format!("webhook answered HTTP {}", code)))
        }
        Err(e) => Json(IngestResponse::err(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartwatch_core::ObserverMessage;
    use pretty_assertions::assert_eq;

    async fn test_state() -> (
        Arc<IngestState>,
        mpsc::Receiver<ObserverMessage>,
        mpsc::Receiver<DomCommand>,
    ) {
        let (signal_tx, signal_rx) = mpsc::channel(8);
        let (dom_tx, dom_rx) = mpsc::channel(8);
        let store = Store::connect("sqlite::memory:").await.unwrap();
        let state = Arc::new(IngestState {
            signal_tx,
            dom_tx,
            store,
            forwarder: Arc::new(Forwarder::new()),
        });
        (state, signal_rx, dom_rx)
    }

    #[tokio::test]
    async fn test_signal_requires_known_type() {
        let (state, _signal_rx, _dom_rx) = test_state().await;
        let msg = IngestMessage {
            kind: "SOMETHING_ELSE".to_string(),
            url: "https://chart.example".to_string(),
            source: None,
            html: None,
            title: None,
            text: None,
        };
        let Json(response) = signal_handler(State(state), Json(msg)).await;
        assert!(!response.success);
    }

    #[tokio::test]
    async fn test_dom_signal_becomes_snapshot() {
        let (state, _signal_rx, mut dom_rx) = test_state().await;
        let msg = IngestMessage {
            kind: ALERT_MESSAGE_TYPE.to_string(),
            url: "https://chart.example/xauusd".to_string(),
            source: Some("dom".to_string()),
            html: Some("<div class=\"tv-toast\">buy now</div>".to_string()),
            title: Some("XAUUSD chart".to_string()),
            text: None,
        };
        let Json(response) = signal_handler(State(state), Json(msg)).await;
        assert!(response.success);

        match dom_rx.try_recv().unwrap() {
            DomCommand::Snapshot(snapshot) => {
                assert_eq!(snapshot.title, "XAUUSD chart");
                assert!(snapshot.html.contains("buy now"));
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_manual_signal_reaches_pipeline_channel() {
        let (state, mut signal_rx, _dom_rx) = test_state().await;
        let msg = IngestMessage {
            kind: ALERT_MESSAGE_TYPE.to_string(),
            url: "manual".to_string(),
            source: Some("manual".to_string()),
            html: None,
            title: None,
            text: Some("sell EURUSD at 1.0850".to_string()),
        };
        let Json(response) = signal_handler(State(state), Json(msg)).await;
        assert!(response.success);

        match signal_rx.try_recv().unwrap() {
            ObserverMessage::Signal(RawSignal::Manual { text, .. }) => {
                assert_eq!(text, "sell EURUSD at 1.0850");
            }
            other => panic!("expected manual signal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_save_config_validates() {
        let (state, _signal_rx, _dom_rx) = test_state().await;

        let bad = RelayConfig {
            webhook_url: String::new(),
            ..Default::default()
        };
        let response = save_config_handler(State(state.clone()), Json(bad))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let good = RelayConfig {
            webhook_url: "https://hooks.example.com/alerts".to_string(),
            ..Default::default()
        };
        let response = save_config_handler(State(state.clone()), Json(good.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let loaded = state.store.load_config().await.unwrap();
        assert_eq!(loaded, good);
    }
}
