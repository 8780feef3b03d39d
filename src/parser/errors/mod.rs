//! Parser error handling module
//!
//! - [`ParserErrorKind`]: structural error kinds with stable codes
//! - [`ParserError`]: an error record (kind, token, root line, stack depth, file)
//! - [`AnalyzeFault`]: a failure analysing one token, isolated by the main loop

mod codes;
mod error;

pub use codes::ParserErrorKind;
pub use error::{AnalyzeFault, ParserError};
