//! Aggregation queries over a loaded dataset.

pub mod aggregator;

pub use aggregator::*;
