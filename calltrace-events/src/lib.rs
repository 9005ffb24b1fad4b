//! # calltrace events
//!
//! This crate contains the definitions of the events emitted on the control
//! channel as well as some ancillary helpers to parse, display and read them
//! back from files.

pub mod events;
pub use events::*;

pub mod display;
pub use display::*;

pub mod file;

pub mod function;
pub use function::*;
pub mod thread;
pub use thread::*;

// Re-export derive macros.
use calltrace_derive::*;
