//! Dataset loading.
//!
//! This module turns the line-delimited input file into the validated,
//! immutable snapshot the reports run against.

pub mod loader;

pub use loader::*;
