//! The six standard reports and their orchestration.

pub mod generator;

pub use generator::*;
