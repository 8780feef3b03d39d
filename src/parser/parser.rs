//! Single-pass parser
//!
//! ```text
//!   text ─► tokenize ─► TokenCursor ─┐
//!                                    ▼
//!          ┌──────── advance one token ◄──────────────┐
//!          │  for_each_token   line info, statement   │
//!          │  analyze          directives, statements │
//!          │  expand_at(NEXT)  includes, {&refs}      │
//!          └──────────────────────────────────────────┘
//!                                    ▼
//!               finish: backfill lines, drain the stack
//! ```
//!
//! The token ahead of the cursor is expanded only after the current token
//! was analysed, so an `&IF` that turns a branch false stops expansion of
//! the branch. Analysis of one token never aborts the pass: a failure is an
//! [`AnalyzeFault`], logged and skipped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use smol_str::SmolStr;

use super::context::ParseContext;
use super::cursor::{Ahead, TokenCursor};
use super::environment::ParseEnvironment;
use super::errors::{AnalyzeFault, ParserError, ParserErrorKind};
use super::items::{FileItem, ItemId, ItemKind, ParsedItem};
use super::lexer::tokenize;
use super::preprocessor::IncludeCall;
use super::scope::{Scope, ScopeFrame, ScopeKind};
use super::token::{Token, TokenKind};
use crate::project::{DirectoryIndex, LoadError};

// ============================================================================
// RESULT TYPES
// ============================================================================

/// One file of the include chain. Entry 0 is the parsed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeEntry {
    /// As written in the include directive (the file name for the root)
    pub name: SmolStr,
    pub path: Option<PathBuf>,
    /// The include directive; `None` for the root
    pub trigger: Option<Token>,
    /// Owner index of the including file
    pub parent: Option<u32>,
    /// Root-file line every token of this file is attributed to
    pub root_line: u32,
    pub args: IncludeCall,
}

impl IncludeEntry {
    pub fn root(path: Option<PathBuf>) -> Self {
        let name = path
            .as_deref()
            .and_then(Path::file_name)
            .map_or_else(|| SmolStr::new("<input>"), |n| SmolStr::new(n.to_string_lossy()));
        Self {
            name,
            path,
            trigger: None,
            parent: None,
            root_line: 0,
            args: IncludeCall::default(),
        }
    }

    pub fn new(name: impl Into<SmolStr>, path: Option<PathBuf>, trigger: Token, parent: u32, root_line: u32) -> Self {
        Self {
            name: name.into(),
            path,
            trigger: Some(trigger),
            parent: Some(parent),
            root_line,
            args: IncludeCall::default(),
        }
    }

    pub fn with_args(mut self, args: IncludeCall) -> Self {
        self.args = args;
        self
    }
}

/// Scope stack as it was at the end of one root-file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInfo {
    pub scope: Arc<[ScopeFrame]>,
    pub in_false_branch: bool,
}

impl LineInfo {
    /// Open blocks and routines, for indentation.
    pub fn depth(&self) -> usize {
        self.scope
            .iter()
            .filter(|f| !matches!(f.kind, ScopeKind::File | ScopeKind::PreprocIf | ScopeKind::PreprocSuspend))
            .count()
    }

    /// Open routines and preprocessor blocks, for the outline.
    pub fn outline_depth(&self) -> usize {
        self.scope
            .iter()
            .filter(|f| !matches!(f.kind, ScopeKind::File | ScopeKind::PreprocIf | ScopeKind::Block))
            .count()
    }

    /// Innermost item owning the line.
    pub fn section(&self) -> Option<ItemId> {
        self.scope.iter().rev().find_map(|f| f.item)
    }
}

/// Everything one parse produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub path: Option<PathBuf>,
    /// Item arena in emission order; item 0 is the file
    pub items: Vec<ParsedItem>,
    /// Indexed by root-file line, total over `0..=last_line`
    pub line_info: Vec<LineInfo>,
    pub errors: Vec<ParserError>,
    pub includes: Vec<IncludeEntry>,
    /// Expanded token stream, when `keep_expanded_text` is set
    pub tokens: Option<Vec<Token>>,
    /// Scopes still open at end of input, root included
    pub final_stack_depth: usize,
}

impl ParseResult {
    pub fn item(&self, id: ItemId) -> Option<&ParsedItem> {
        self.items.get(id.index())
    }

    /// The file item.
    pub fn root(&self) -> Option<&ParsedItem> {
        self.items.first()
    }

    pub fn children(&self, id: ItemId) -> impl Iterator<Item = &ParsedItem> {
        self.item(id)
            .into_iter()
            .flat_map(|item| item.children.iter())
            .filter_map(|child| self.item(*child))
    }

    pub fn line(&self, line: u32) -> Option<&LineInfo> {
        self.line_info.get(line as usize)
    }

    /// Innermost scope item at a root-file line.
    pub fn scope_of_line(&self, line: u32) -> Option<&ParsedItem> {
        self.line(line)
            .and_then(LineInfo::section)
            .and_then(|id| self.item(id))
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Items of a given variant, by the name [`ItemKind::as_str`] gives.
    pub fn items_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a ParsedItem> + 'a {
        self.items.iter().filter(move |item| item.kind.as_str() == kind)
    }
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Parse `text` as the file at `path` (used for include resolution and
/// error records).
pub fn parse(text: &str, path: Option<&Path>, env: &ParseEnvironment) -> ParseResult {
    let _span = tracing::debug_span!("parse", path = ?path).entered();
    let mut parser = Parser::new(text, path, env);
    parser.run();
    parser.finish()
}

/// Read `path` through the environment's resolver and parse it.
pub fn parse_file(path: &Path, env: &ParseEnvironment) -> Result<ParseResult, LoadError> {
    let text = env.resolver.load(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&text, Some(path), env))
}

// ============================================================================
// PARSER
// ============================================================================

pub(crate) struct Parser<'e> {
    pub(super) cursor: TokenCursor,
    pub(super) env: &'e ParseEnvironment,
    /// Directory snapshot taken for the whole run
    pub(super) directory: Arc<DirectoryIndex>,
    pub(super) ctx: ParseContext,
}

impl<'e> Parser<'e> {
    fn new(text: &str, path: Option<&Path>, env: &'e ParseEnvironment) -> Self {
        let tokens = tokenize(text);
        let mut ctx = ParseContext::new(IncludeEntry::root(path.map(Path::to_path_buf)));

        let file_token = Token::eof(0, 0, Default::default());
        let name = ctx.includes[0].name.clone();
        let file = ctx.add_item_in(
            None,
            name,
            &file_token,
            ItemKind::File(FileItem {
                path: path.map(Path::to_path_buf),
            }),
        );
        ctx.stack.push(Scope::File { item: file }, 0);

        let mut parser = Self {
            cursor: TokenCursor::new(tokens),
            env,
            directory: env.directory.snapshot(),
            ctx,
        };
        parser.expand_at(Ahead::NEXT, true);
        parser.expand_at(Ahead::NEXT.next(), true);
        parser
    }

    fn run(&mut self) {
        while self.cursor.advance() {
            let token = self.cursor.current().clone();
            if token.is_eof() {
                break;
            }

            let skipping = self.ctx.skip > 0;
            self.for_each_token(&token, skipping);
            if skipping {
                self.ctx.skip -= 1;
            } else if let Err(fault) = self.analyze(&token) {
                tracing::warn!(line = token.display_line(), owner = token.owner, %fault, "analysis failed");
            }

            if self.ctx.skip == 0 && !self.ctx.stack.in_false_branch() {
                self.expand_at(Ahead::NEXT, true);
            }
        }
    }

    /// Bookkeeping that runs for every token, skipped or not.
    fn for_each_token(&mut self, token: &Token, skipping: bool) {
        match token.kind {
            TokenKind::Eol => {
                let line = self.ctx.root_line(token);
                self.ctx.record_line(line);
            }
            TokenKind::Eos if !skipping => {
                let statement = std::mem::take(&mut self.ctx.statement);
                self.ctx.read_next_word_as_statement_start = false;
                if !statement.is_empty() && !self.ctx.stack.in_false_branch() {
                    self.ctx.finished = Some(statement);
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> ParseResult {
        let eof = self.cursor.current().clone();
        let eof_line = self.ctx.root_line(&eof);
        self.ctx.record_line(eof_line);

        let statement = std::mem::take(&mut self.ctx.statement);
        if !statement.is_empty() && !self.ctx.stack.in_false_branch() {
            if let Err(fault) = self.end_statement(statement, &eof) {
                tracing::warn!(%fault, "closing the last statement failed");
            }
        }

        let line_info = self.ctx.backfill_lines();
        let final_stack_depth = self.ctx.stack.len();

        while !self.ctx.stack.is_empty() {
            let depth = self.ctx.stack.len();
            let Some((scope, line)) = self.ctx.stack.pop() else {
                break;
            };
            let kind = match &scope {
                Scope::File { item } => {
                    if let Err(fault) = self.ctx.set_end_line(*item, eof_line) {
                        tracing::warn!(%fault, "file item missing");
                    }
                    continue;
                }
                Scope::Routine { .. } | Scope::Block { .. } => ParserErrorKind::MissingBlockEnd,
                Scope::PreprocIf { .. } => ParserErrorKind::MissingPreprocEndIf,
                Scope::PreprocSuspend { .. } => ParserErrorKind::MissingSuspendEnd,
            };
            if let Some(opener) = scope.opener() {
                self.ctx.error_at(kind, opener, line, depth);
            }
        }

        if let Some(path) = &self.ctx.includes[0].path {
            self.env.includes.invalidate(path);
        }

        let tokens = if self.env.options.keep_expanded_text {
            Some(self.cursor.into_tokens())
        } else {
            None
        };

        tracing::debug!(
            items = self.ctx.items.len(),
            errors = self.ctx.errors.len(),
            lines = line_info.len(),
            "parse finished"
        );

        ParseResult {
            path: self.ctx.includes[0].path.clone(),
            items: self.ctx.items,
            line_info,
            errors: self.ctx.errors,
            includes: self.ctx.includes,
            tokens,
            final_stack_depth,
        }
    }

    /// Grammar-sensitive dispatch for one token.
    fn analyze(&mut self, token: &Token) -> Result<(), AnalyzeFault> {
        if self.ctx.stack.is_empty() {
            return Err(AnalyzeFault::EmptyScopeStack {
                line: token.display_line(),
            });
        }
        match token.kind {
            TokenKind::PreprocDirective => self.directive(token),
            _ if self.ctx.stack.in_false_branch() => Ok(()),
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Eol => {
                self.ctx.spaced = true;
                Ok(())
            }
            TokenKind::Eos => {
                self.ctx.spaced = true;
                match self.ctx.finished.take() {
                    Some(statement) => self.end_statement(statement, token),
                    None => Ok(()),
                }
            }
            TokenKind::Include | TokenKind::PreprocVariable | TokenKind::Eof => Ok(()),
            _ => self.statement_token(token),
        }
    }
}
