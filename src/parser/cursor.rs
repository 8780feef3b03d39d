//! Token cursor with forward-only splicing
//!
//! ```text
//!            cursor
//!              v
//!   [ t0  t1  t2 | t3  t4  t5 ... EOF ]
//!                  Ahead(1) Ahead(2) ...     <- replace / insert / remove
//!      peek(-2) peek(-1) peek(0) peek(1)     <- lookups in both directions
//! ```
//!
//! The cursor starts before the first token. Mutations take an [`Ahead`]
//! distance, which is never zero, so the current token and everything behind
//! it cannot be rewritten.

use std::num::NonZeroUsize;

use text_size::TextSize;

use super::token::{Token, TokenKind};

/// A strictly positive distance ahead of the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ahead(NonZeroUsize);

impl Ahead {
    pub const NEXT: Ahead = Ahead(NonZeroUsize::MIN);

    /// `None` for zero.
    pub fn new(distance: usize) -> Option<Self> {
        NonZeroUsize::new(distance).map(Self)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

pub struct TokenCursor {
    tokens: Vec<Token>,
    /// Index of the current token plus one; 0 before the first token
    position: usize,
    eof: Token,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof = tokens
            .last()
            .filter(|t| t.is_eof())
            .cloned()
            .unwrap_or_else(|| Token::eof(0, 0, TextSize::new(0)));
        Self {
            tokens,
            position: 0,
            eof,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of the current token, `None` before the first advance.
    pub fn index(&self) -> Option<usize> {
        self.position.checked_sub(1)
    }

    /// Move to the next token; false once past the end.
    pub fn advance(&mut self) -> bool {
        if self.position >= self.tokens.len() {
            return false;
        }
        self.position += 1;
        true
    }

    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    fn absolute(&self, offset: isize) -> Option<usize> {
        let index = self.position as isize - 1 + offset;
        usize::try_from(index).ok().filter(|i| *i < self.tokens.len())
    }

    /// Token at `offset` from the current one; the EOF sentinel when out of
    /// range in either direction.
    pub fn peek(&self, offset: isize) -> &Token {
        self.absolute(offset).map_or(&self.eof, |i| &self.tokens[i])
    }

    pub fn peek_ahead(&self, ahead: Ahead) -> &Token {
        self.peek(ahead.get() as isize)
    }

    /// First token of `kind`, scanning from `from` (exclusive) forward or
    /// backward. Stops at the EOF sentinel.
    pub fn peek_next_of_kind(&self, from: isize, kind: TokenKind, backward: bool) -> (isize, &Token) {
        self.scan(from, backward, |t| t.kind == kind)
    }

    /// First token whose kind is not in `skip`.
    pub fn peek_next_not_of_kind(&self, from: isize, skip: &[TokenKind], backward: bool) -> (isize, &Token) {
        self.scan(from, backward, |t| !skip.contains(&t.kind))
    }

    fn scan(&self, from: isize, backward: bool, matches: impl Fn(&Token) -> bool) -> (isize, &Token) {
        let step = if backward { -1 } else { 1 };
        let mut offset = from;
        loop {
            offset += step;
            if self.absolute(offset).is_none() {
                return (offset, &self.eof);
            }
            let token = self.peek(offset);
            if token.is_eof() || matches(token) {
                return (offset, token);
            }
        }
    }

    /// Next significant (non-trivia) token after the current one.
    pub fn peek_significant(&self) -> &Token {
        self.peek_next_not_of_kind(0, &TRIVIA, false).1
    }

    /// Previous significant token before the current one.
    pub fn peek_significant_back(&self) -> &Token {
        self.peek_next_not_of_kind(0, &TRIVIA, true).1
    }

    // ========================================================================
    // MUTATION (strictly ahead of the cursor)
    // ========================================================================

    /// Absolute index for `ahead`, clamped to the end of the stream.
    fn ahead_index(&self, ahead: Ahead) -> usize {
        (self.position + ahead.get() - 1).min(self.tokens.len())
    }

    /// Replace one token; no-op past the end.
    pub fn replace(&mut self, ahead: Ahead, token: Token) {
        let index = self.ahead_index(ahead);
        if let Some(slot) = self.tokens.get_mut(index) {
            *slot = token;
        }
    }

    /// Insert `tokens` so the first lands at `ahead`.
    pub fn insert(&mut self, ahead: Ahead, tokens: impl IntoIterator<Item = Token>) {
        let index = self.ahead_index(ahead);
        self.tokens.splice(index..index, tokens);
    }

    /// Remove up to `count` tokens starting at `ahead`.
    pub fn remove(&mut self, ahead: Ahead, count: usize) {
        let start = self.ahead_index(ahead);
        let end = start.saturating_add(count).min(self.tokens.len());
        self.tokens.drain(start..end);
    }

    /// Replace the token at `ahead` by `tokens` (possibly none).
    pub fn splice(&mut self, ahead: Ahead, tokens: impl IntoIterator<Item = Token>) {
        let index = self.ahead_index(ahead);
        if index < self.tokens.len() {
            self.tokens.splice(index..=index, tokens);
        }
    }

    /// Absolute index a given distance ahead (for bookkeeping of expanded
    /// positions).
    pub fn absolute_ahead(&self, ahead: Ahead) -> usize {
        self.ahead_index(ahead)
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

pub const TRIVIA: [TokenKind; 3] = [TokenKind::Whitespace, TokenKind::Comment, TokenKind::Eol];
