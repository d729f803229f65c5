//! Heuristic alert extraction.
//!
//! Turns raw observed signals (DOM fragment text, WebSocket payloads,
//! manual test input) into normalized [`chartwatch_core::AlertRecord`]s.
//! Everything here is best-effort pattern matching: an input that does
//! not look like an alert is rejected with `None`, never an error.

pub mod dom;
pub mod extractor;
pub mod keywords;
pub mod socket;

pub use dom::FragmentScanner;
pub use extractor::Extractor;
pub use keywords::{classify, ALERT_SELECTORS, KIND_RULES, LIKELY_ALERT_KEYWORDS};
pub use socket::{decode_socket_payload, SocketAlert};
