//! IDE layer tests
//!
//! Tests for:
//! - Outline, completion and document links over realistic sources
//! - ParseScheduler coalescing, per-source exclusivity and listeners

pub mod tests_features;
pub mod tests_scheduler;
