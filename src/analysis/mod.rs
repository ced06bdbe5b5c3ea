//! Analysis modules.
//!
//! Bucketing and accumulation of normalized records into tier and
//! region breakdowns.

pub mod aggregator;

pub use aggregator::*;
