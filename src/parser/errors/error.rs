//! Parser error records and per-token analysis faults

use std::fmt;
use std::path::PathBuf;

use smol_str::SmolStr;
use thiserror::Error;

use super::codes::ParserErrorKind;
use crate::parser::items::ItemId;
use crate::parser::token::Token;

/// A structural error. Errors are data returned with the parse result; the
/// parser never fails on malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    pub kind: ParserErrorKind,
    /// The offending token (the opener for unclosed scopes)
    pub token: Token,
    /// Line in the root file
    pub root_line: u32,
    /// Number of open scopes when the error was found
    pub stack_depth: usize,
    /// File containing `token`, when known
    pub file: Option<PathBuf>,
}

impl ParserError {
    pub fn new(kind: ParserErrorKind, token: Token, root_line: u32, stack_depth: usize) -> Self {
        Self {
            kind,
            token,
            root_line,
            stack_depth,
            file: None,
        }
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn message(&self) -> &'static str {
        self.kind.description()
    }
}

/// `file:line: description`, with the 1-based line of the token in its own file.
impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(path) => write!(f, "{}", path.display())?,
            None => write!(f, "<input>")?,
        }
        write!(f, ":{}: {}", self.token.display_line(), self.kind.description())
    }
}

/// Failure while analysing one token. Caught by the main loop, logged, and
/// the pass continues with the next token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyzeFault {
    #[error("`{keyword}` statement at line {line} has no name")]
    MissingName { keyword: SmolStr, line: u32 },

    #[error("item {0:?} does not exist")]
    DanglingItem(ItemId),

    #[error("no scope is open at line {line}")]
    EmptyScopeStack { line: u32 },
}
