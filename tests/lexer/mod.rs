//! Lexer tests
//!
//! Tests for:
//! - Token stream invariants over arbitrary input
//! - Token kinds of ABL constructs

pub mod tests_tokenize;
