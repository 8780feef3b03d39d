//! # abl-base
//!
//! Incremental outline parser for OpenEdge ABL: lexing, include and
//! preprocessor splicing, scope tracking, parsed items and structural errors.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → Outline, completion, document links, debug dumps, ParseScheduler
//!   ↓
//! project   → Schema dumps, SchemaDirectory, include cache and resolvers, batch parsing
//!   ↓
//! parser    → Logos lexer, token cursor, preprocessor, scopes, items, visitor
//!   ↓
//! core      → Text utilities (ABL word characters, word at cursor)
//!   ↓
//! base      → Primitives (Position, Span, TextRange, constants)
//! ```
//!
//! The parser reads the schema directory and include resolvers from
//! `project` through a [`ParseEnvironment`](parser::ParseEnvironment), and
//! `project` parses whole directories with the parser.

// ============================================================================
// MODULES (dependency order: base → core → parser → project → ide)
// ============================================================================

/// Foundation types: Position, Span, TextRange, constants
pub mod base;

/// Text helpers shared by the parser and the IDE layer
pub mod core;

/// Parser: lexer, expansion, scopes, statement analysis, items
pub mod parser;

/// Project: schema directory, include resolution and caching, batch parsing
pub mod project;

/// IDE features: outline, completion, document links, scheduling
pub mod ide;

// Re-export commonly needed items
pub use parser::keywords;

// Re-export foundation types
pub use base::{Position, Span, TextRange, TextSize};
pub use parser::{parse, parse_file, ParseEnvironment, ParseResult};
