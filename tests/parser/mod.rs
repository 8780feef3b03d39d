//! Parser tests
//!
//! Tests for:
//! - Block structure, line info and structural errors
//! - Preprocessor directives and references
//! - Include expansion from disk
//! - Determinism of repeated parses
//! - Visitor protocol

pub mod tests_includes;
pub mod tests_preprocessor;
pub mod tests_structure;
pub mod tests_visitor;
