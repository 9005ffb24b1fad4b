//! # Core
//!
//! Session management: thread tracing, probe registry and the interfaces to
//! the host-provided collaborators (engine, symbolication and event sink).

pub mod address;
pub use address::*;
pub mod engine;
pub use engine::*;
pub mod sink;
pub use sink::*;
pub mod symbols;
pub use symbols::*;

pub mod probe;
pub mod tracer;
pub use tracer::*;
