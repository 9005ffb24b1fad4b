//! # calltrace
//!
//! Per-thread call tracing and hot-swappable address probes, on top of a
//! host-provided instrumentation engine.
//!
//! The host builds an [`control::Agent`] from its engine and handler compiler,
//! then feeds it commands. Summaries of followed threads and probe logs are
//! sent back as events.

// Re-export events crate, so events appear as a module of this crate.
pub use events;

pub mod cli;
pub mod config;
pub mod control;
pub mod core;
pub mod helpers;

#[cfg(test)]
mod testing;
