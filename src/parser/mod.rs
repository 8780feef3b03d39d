//! Single-pass outline parser for OpenEdge ABL
//!
//! The parser does not build a syntax tree. It walks the token stream once,
//! splicing include files and preprocessor values in ahead of the cursor,
//! and records what an editor needs: declared items, the scope stack at
//! every line, and structural errors.
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens (owned, with line/column/owner)
//!     ↓
//! TokenCursor → expand ahead: {include.i}, {&name}
//!     ↓
//! Parser → directives (&IF, &SCOPED-DEFINE...), statements
//!     ↓
//! ParseResult → items, line info, errors, include chain
//! ```
//!
//! ## Usage
//!
//! ```
//! use abl::parser::{parse, ParseEnvironment};
//!
//! let result = parse("PROCEDURE main:\nEND PROCEDURE.\n", None, &ParseEnvironment::default());
//! assert!(result.is_ok());
//! assert_eq!(result.items_of("procedure").count(), 1);
//! ```

#[allow(clippy::module_inception)]
mod parser;

mod analyze;
mod context;
pub mod cursor;
mod directives;
mod environment;
pub mod errors;
mod expand;
pub mod items;
pub mod keywords;
mod lexer;
mod options;
pub mod preprocessor;
pub mod scope;
mod token;
mod visitor;

pub use cursor::{Ahead, TokenCursor};
pub use environment::ParseEnvironment;
pub use errors::{AnalyzeFault, ParserError, ParserErrorKind};
pub use items::*;
pub use lexer::{tokenize, tokenize_fragment, Lexer};
pub use options::{ParserOptions, PreprocessorEnv};
pub use parser::{parse, parse_file, IncludeEntry, LineInfo, ParseResult};
pub use scope::{RoutineKind, Scope, ScopeFrame, ScopeKind, ScopeStack};
pub use token::{Token, TokenKind};
pub use visitor::ParserVisitor;

/// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
