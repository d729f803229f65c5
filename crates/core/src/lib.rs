//! Core data types for the chartwatch alert relay.

pub mod alert;
pub mod dedup;
pub mod signal;

pub use alert::*;
pub use dedup::*;
pub use signal::*;
