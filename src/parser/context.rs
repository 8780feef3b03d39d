//! Per-run parse state
//!
//! Everything the pass mutates besides the token stream: the scope stack,
//! the statement being collected, the item arena, errors, line info, the
//! include chain and the preprocessor definitions. A context lives for one
//! run and is consumed into a [`ParseResult`](super::ParseResult).

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::errors::{AnalyzeFault, ParserError, ParserErrorKind};
use super::items::{ItemId, ItemKind, ParsedItem};
use super::keywords::StatementKind;
use super::parser::{IncludeEntry, LineInfo};
use super::preprocessor::Defines;
use super::scope::{Scope, ScopeStack};
use super::token::{Token, TokenKind};

// ============================================================================
// STATEMENT
// ============================================================================

/// A significant token of the current statement.
#[derive(Debug, Clone)]
pub(crate) struct StatementPart {
    pub token: Token,
    /// Whitespace, a comment or a line break came before it
    pub spaced: bool,
}

/// The statement being collected, up to its `.` or `:`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Statement {
    pub kind: StatementKind,
    pub parts: Vec<StatementPart>,
    pub word_count: usize,
    /// The first word is not in the directory
    pub unknown_first_word: bool,
    /// `ON ... OF ...` trigger the statement was restarted for
    pub on_item: Option<ItemId>,
}

impl Statement {
    pub fn first(&self) -> Option<&Token> {
        self.parts.first().map(|p| &p.token)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.parts.get(index).map(|p| &p.token)
    }

    /// Index of the first part that is `word`.
    pub fn find_word(&self, word: &str) -> Option<usize> {
        self.parts.iter().position(|p| p.token.is_word(word))
    }

    pub fn has_word(&self, word: &str) -> bool {
        self.find_word(word).is_some()
    }

    /// Text of the significant token after the word at `index`.
    pub fn word_after(&self, index: usize) -> Option<&Token> {
        self.token(index + 1)
    }

    /// Text of the first parenthesised group, without the parentheses.
    pub fn first_group(&self) -> String {
        let Some(open) = self.parts.iter().position(|p| p.token.is_symbol("(")) else {
            return String::new();
        };
        let mut depth = 0usize;
        let mut text = String::new();
        for part in &self.parts[open..] {
            if part.token.is_symbol("(") {
                depth += 1;
                if depth == 1 {
                    continue;
                }
            } else if part.token.is_symbol(")") {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            if part.spaced && !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&part.token.text);
        }
        text
    }

    /// True while every part after the first is glued to the previous one,
    /// which is how a `RUN dir/proc.p` target is written.
    pub fn in_run_target(&self, spaced: bool) -> bool {
        self.kind == StatementKind::Run
            && match self.parts.len() {
                0 => false,
                1 => true,
                _ => !spaced && self.parts[2..].iter().all(|p| !p.spaced),
            }
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Prototype and implementation seen for one function name.
#[derive(Debug, Clone, Default)]
pub(crate) struct FunctionEntry {
    pub prototype: Option<ItemId>,
    pub implementation: Option<ItemId>,
}

pub(crate) struct ParseContext {
    pub stack: ScopeStack,
    pub statement: Statement,
    /// Statement closed by the last `Eos`, waiting for analysis
    pub finished: Option<Statement>,
    pub read_next_word_as_statement_start: bool,
    /// Whitespace seen since the last significant token
    pub spaced: bool,
    /// Label waiting for the block it names
    pub pending_label: Option<ItemId>,
    pub last_on_block: Option<ItemId>,
    /// Functions by lowercase name, in declaration order
    pub functions: IndexMap<SmolStr, FunctionEntry>,
    pub defines: Defines,
    pub includes: Vec<IncludeEntry>,
    /// Temp-tables and buffers defined in this file: lowercase name -> temp
    pub local_tables: FxHashMap<SmolStr, bool>,
    pub seen_words: FxHashSet<SmolStr>,
    pub table_uses: FxHashSet<(Option<ItemId>, SmolStr)>,
    /// Tokens still to pass without analysis (directive bodies)
    pub skip: usize,
    /// Highest token index already expanded
    pub expanded_through: Option<usize>,
    /// Counter behind `{&SEQUENCE}`
    pub sequence: u32,
    pub items: Vec<ParsedItem>,
    pub errors: Vec<ParserError>,
    pub lines: Vec<Option<LineInfo>>,
}

impl ParseContext {
    pub fn new(root: IncludeEntry) -> Self {
        Self {
            stack: ScopeStack::new(),
            statement: Statement::default(),
            finished: None,
            read_next_word_as_statement_start: false,
            spaced: false,
            pending_label: None,
            last_on_block: None,
            functions: IndexMap::new(),
            defines: Defines::default(),
            includes: vec![root],
            local_tables: FxHashMap::default(),
            seen_words: FxHashSet::default(),
            table_uses: FxHashSet::default(),
            skip: 0,
            expanded_through: None,
            sequence: 0,
            items: Vec::new(),
            errors: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Line in the root file a token is attributed to.
    pub fn root_line(&self, token: &Token) -> u32 {
        match token.owner {
            0 => token.line,
            owner => self
                .includes
                .get(owner as usize)
                .map_or(token.line, |entry| entry.root_line),
        }
    }

    /// `owner` followed by its including files, up to the root.
    pub fn owner_chain(&self, owner: u32) -> Vec<u32> {
        let mut chain = vec![owner];
        let mut current = owner;
        while let Some(parent) = self.includes.get(current as usize).and_then(|e| e.parent) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Scope item new items attach to.
    pub fn scope_item(&self) -> Option<ItemId> {
        self.statement.on_item.or_else(|| self.stack.current_item())
    }

    // ========================================================================
    // ITEMS
    // ========================================================================

    /// Append an item under the current scope item.
    pub fn add_item(&mut self, name: impl Into<SmolStr>, token: &Token, kind: ItemKind) -> ItemId {
        let scope = self.scope_item();
        self.add_item_in(scope, name, token, kind)
    }

    pub fn add_item_in(
        &mut self,
        scope: Option<ItemId>,
        name: impl Into<SmolStr>,
        token: &Token,
        kind: ItemKind,
    ) -> ItemId {
        let id = ItemId(self.items.len() as u32);
        let item = ParsedItem {
            id,
            name: name.into(),
            token: token.clone(),
            root_line: self.root_line(token),
            scope,
            children: Vec::new(),
            end_line: None,
            kind,
        };
        tracing::trace!(kind = item.kind.as_str(), name = %item.name, line = item.root_line, "item");
        self.items.push(item);
        if let Some(parent) = scope.and_then(|s| self.items.get_mut(s.index())) {
            parent.children.push(id);
        }
        id
    }

    pub fn item_mut(&mut self, id: ItemId) -> Result<&mut ParsedItem, AnalyzeFault> {
        self.items.get_mut(id.index()).ok_or(AnalyzeFault::DanglingItem(id))
    }

    pub fn set_end_line(&mut self, id: ItemId, line: u32) -> Result<(), AnalyzeFault> {
        self.item_mut(id)?.end_line = Some(line);
        Ok(())
    }

    // ========================================================================
    // SCOPES AND ERRORS
    // ========================================================================

    pub fn push_scope(&mut self, scope: Scope, opener: &Token) {
        let line = self.root_line(opener);
        self.stack.push(scope, line);
    }

    /// Record an error at `token`, with the current stack depth.
    pub fn error(&mut self, kind: ParserErrorKind, token: &Token) {
        let line = self.root_line(token);
        self.error_at(kind, token, line, self.stack.len());
    }

    pub fn error_at(&mut self, kind: ParserErrorKind, token: &Token, root_line: u32, depth: usize) {
        let file = self
            .includes
            .get(token.owner as usize)
            .and_then(|entry| entry.path.clone());
        tracing::debug!(code = kind.code(), line = root_line, "structural error");
        self.errors
            .push(ParserError::new(kind, token.clone(), root_line, depth).with_file(file));
    }

    // ========================================================================
    // LINE INFO
    // ========================================================================

    /// Snapshot the stack for `line`, overwriting an earlier snapshot.
    pub fn record_line(&mut self, line: u32) {
        let index = line as usize;
        if self.lines.len() <= index {
            self.lines.resize(index + 1, None);
        }
        let in_false_branch = self.stack.in_false_branch();
        self.lines[index] = Some(LineInfo {
            scope: self.stack.snapshot(),
            in_false_branch,
        });
    }

    /// Lines never recorded (inside multi-line comments and strings) take
    /// the snapshot of the nearest following recorded line.
    pub fn backfill_lines(&mut self) -> Vec<LineInfo> {
        let mut next: Option<LineInfo> = None;
        let mut filled: Vec<LineInfo> = Vec::with_capacity(self.lines.len());
        for slot in self.lines.iter().rev() {
            let info = match slot {
                Some(info) => info.clone(),
                None => next.clone().unwrap_or_else(|| LineInfo {
                    scope: Arc::from(Vec::new()),
                    in_false_branch: false,
                }),
            };
            next = Some(info.clone());
            filled.push(info);
        }
        filled.reverse();
        filled
    }

    /// Whether a word should be treated as a statement start.
    pub fn starts_statement(&self, token: &Token) -> bool {
        self.statement.is_empty() || (self.read_next_word_as_statement_start && token.kind == TokenKind::Word)
    }
}
