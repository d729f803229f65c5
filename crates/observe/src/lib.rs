//! Observer ports: components that watch an external, uncontrolled
//! data source for raw alert signals.
//!
//! Two ports are provided:
//!
//! - [`SocketTap`] holds a WebSocket connection to the charting
//!   platform's data host and emits every inbound text frame whose
//!   connection URL passed the [`UrlPredicate`].
//! - [`DomWatcher`] scans DOM fragment snapshots pushed in by a
//!   page-side companion, on arrival, every two seconds, and on
//!   focus notifications.
//!
//! Both emit [`chartwatch_core::ObserverMessage`] into the pipeline
//! channel; neither decides what is an alert — that is the
//! extractor's job.

pub mod dom;
pub mod error;
pub mod port;
pub mod websocket;

pub use dom::{DomCommand, DomWatcher, PageSnapshot};
pub use error::ObserveError;
pub use port::{SignalSource, UrlPredicate};
pub use websocket::{SocketTap, TapConfig};
