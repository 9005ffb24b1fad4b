//! # Probe
//!
//! Probes run custom logic each time a given address executes. The registry
//! keeps at most one probe per address and allows replacing a probe's logic
//! without touching its engine registration.

pub mod handler;
pub use handler::*;
pub mod registry;
pub use registry::*;
