//! Alert forwarding: persisted relay configuration, duplicate
//! suppression, and webhook delivery.

pub mod config;
pub mod forwarder;
pub mod pipeline;
pub mod store;

pub use config::{RelayConfig, RelayStats};
pub use forwarder::{Dispatch, ForwardError, Forwarder};
pub use pipeline::Pipeline;
pub use store::{Store, StoreError};
