//! # Symbols
//!
//! Symbolication of raw addresses into module-relative locations.

pub mod maps;
pub use maps::*;
pub mod resolver;
pub use resolver::*;
