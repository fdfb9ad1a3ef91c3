//! Chart rendering backends.

pub mod chart;

pub use chart::*;
