//! chartwatch - Headless TradingView Alert Relay
//!
//! Watches page snapshots and tapped WebSocket frames for alert
//! candidates and forwards the extracted alerts to a configured
//! webhook endpoint.

mod ingest;

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use chartwatch_forward::{Forwarder, Pipeline, Store};
use chartwatch_observe::{
    DomCommand, DomWatcher, SignalSource, SocketTap, TapConfig, UrlPredicate,
};
use ingest::IngestState;

/// chartwatch CLI
#[derive(Parser, Debug)]
#[command(name = "chartwatch")]
#[command(about = "TradingView alert to webhook relay", long_about = None)]
struct Args {
    /// SQLite database holding relay config and stats
    #[arg(short, long, default_value = "sqlite:chartwatch.db")]
    database: String,

    /// Port for the local ingest API
    #[arg(short = 'p', long, default_value_t = 9001)]
    ingest_port: u16,

    /// WebSocket URL to tap directly, bypassing the page companion
    #[arg(long)]
    tap_url: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!("🚀 chartwatch starting...");
    info!("  Database: {}", args.database);
    info!("  Ingest Port: {}", args.ingest_port);
    info!("  Tap URL: {}", args.tap_url.as_deref().unwrap_or("(none)"));

    let store = match Store::connect(&args.database).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return;
        }
    };

    match store.load_config().await {
        Ok(config) => {
            let webhook = if config.webhook_url.is_empty() {
                "(unset)"
            } else {
                config.webhook_url.as_str()
            };
            info!("  Webhook: {}", webhook);
            info!("  Forwarding enabled: {}", config.enabled);
        }
        Err(e) => {
            error!("Failed to load relay config: {}", e);
            return;
        }
    }

    let forwarder = Forwarder::new();

    let (signal_tx, mut signal_rx) = mpsc::channel(1024);
    let (dom_tx, dom_rx) = mpsc::channel::<DomCommand>(64);

    // Page snapshot watcher, fed through the ingest API.
    let watcher = Box::new(DomWatcher::new(dom_rx));
    let watcher_tx = signal_tx.clone();
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = watcher.run(watcher_tx).await {
            warn!("DOM watcher stopped: {}", e);
        }
    });

    // Optional direct WebSocket tap. The URL is operator-chosen, so
    // it is not filtered against the usual TradingView hosts.
    let tap_handle = args.tap_url.as_ref().map(|url| {
        info!("📡 Tapping WebSocket at {}", url);
        let tap = Box::new(SocketTap::new(
            TapConfig::for_url(url.clone()),
            UrlPredicate::any(),
        ));
        let tap_tx = signal_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tap.run(tap_tx).await {
                warn!("Socket tap stopped: {}", e);
            }
        })
    });

    let ingest_state = Arc::new(IngestState {
        signal_tx: signal_tx.clone(),
        dom_tx,
        store: store.clone(),
        forwarder: Arc::new(forwarder.clone()),
    });
    if let Err(e) = ingest::start_ingest_server(ingest_state, args.ingest_port).await {
        error!("Failed to start ingest server: {}", e);
        return;
    }

    // Drain observer messages through the pipeline.
    let mut pipeline = Pipeline::new(store.clone(), forwarder);
    let pipeline_handle = tokio::spawn(async move {
        while let Some(msg) = signal_rx.recv().await {
            pipeline.handle(msg).await;
        }
    });

    info!("Press Ctrl+C to stop...");

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");

    warn!("Shutdown signal received");

    watcher_handle.abort();
    if let Some(handle) = tap_handle {
        handle.abort();
    }
    drop(signal_tx);
    let _ = tokio::time::timeout(Duration::from_secs(2), pipeline_handle).await;

    // Final stats
    if let Ok(stats) = store.load_stats().await {
        info!("📈 Final Stats:");
        info!("  Total alerts forwarded: {}", stats.total_alerts);
        info!(
            "  Last alert: {}",
            stats.last_alert.as_deref().unwrap_or("(none)")
        );
    }

    info!("chartwatch stopped");
}
