//! # Control
//!
//! Control channel of the agent: commands come in as JSON lines, replies and
//! events go out as JSON lines.

pub mod agent;
pub use agent::*;
pub mod command;
pub use command::*;
