//! Project layer tests
//!
//! Tests for:
//! - Schema dump reading and aliases
//! - SchemaDirectory classification, rebuild and snapshots
//! - Batch parsing of a source tree

pub mod tests_schema;
pub mod tests_workspace;
