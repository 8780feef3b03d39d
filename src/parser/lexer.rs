//! Logos-based lexer for ABL
//!
//! The logos enum recognises raw lexemes; [`Lexer`] wraps it, tracks
//! line/column positions and applies the context-sensitive fix-ups that a
//! regular grammar cannot express:
//!
//! ```text
//!   DISPLAY "abc":U.      '.' followed by end of line  -> Eos
//!   x = customer.name.    '.' inside a qualified word   -> part of the Word
//!   "abc":U               ':' + letters after a string  -> StringDescriptor
//! ```
//!
//! The lexer never fails: unterminated strings, comments and braces extend
//! to the end of the input and unrecognised bytes become `Unknown` tokens.

use logos::Logos;
use text_size::{TextRange, TextSize};

use super::token::{Token, TokenKind};
use crate::base::Position;

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    source: &'a str,
    line: u32,
    column: u32,
    previous: Option<TokenKind>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            source: input,
            line: 0,
            column: 0,
            previous: None,
            finished: false,
        }
    }

    /// Move the line/column counters past `text`.
    fn advance_position(&mut self, text: &str) {
        let end = Position::new(self.line, self.column).advanced_past(text);
        self.line = end.line;
        self.column = end.column;
    }

    /// `:U`, `:R30`... directly after a string: extend the current `:` token
    /// over the descriptor letters.
    fn take_string_descriptor(&mut self) -> bool {
        let len: usize = self
            .inner
            .remainder()
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .map(char::len_utf8)
            .sum();
        if len == 0 {
            return false;
        }
        self.inner.bump(len);
        true
    }

    fn ends_statement(&self) -> bool {
        match self.inner.remainder().chars().next() {
            None => true,
            Some(c) => matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0c'),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let Some(logos_token) = self.inner.next() else {
            self.finished = true;
            let end = TextSize::new(self.source.len() as u32);
            return Some(Token::eof(self.line, self.column, end));
        };

        let mut kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => TokenKind::Unknown,
        };

        if kind == TokenKind::Symbol {
            let symbol = self.inner.slice();
            if symbol == ":" && self.previous == Some(TokenKind::String) && self.take_string_descriptor() {
                kind = TokenKind::StringDescriptor;
            } else if (symbol == "." || symbol == ":") && self.ends_statement() {
                kind = TokenKind::Eos;
            }
        }

        let span = self.inner.span();
        let text = &self.source[span.clone()];
        let range = TextRange::new(TextSize::new(span.start as u32), TextSize::new(span.end as u32));
        let token = Token::new(kind, text, self.line, self.column, range);

        self.advance_position(text);
        self.previous = Some(kind);
        Some(token)
    }
}

/// Tokenize an entire string into a Vec.
///
/// The result is never empty and always ends with an `Eof` token whose text
/// is empty, so concatenating every token's text reproduces `input`.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

/// Tokenize a preprocessor value or include body, attributing every token to
/// `owner`. The trailing `Eof` is dropped.
pub fn tokenize_fragment(input: &str, owner: u32) -> Vec<Token> {
    Lexer::new(input)
        .filter(|token| !token.is_eof())
        .map(|token| token.with_owner(owner))
        .collect()
}

// ============================================================================
// CALLBACKS
// ============================================================================

/// Nested `/* ... */`; an unterminated comment runs to the end of input.
fn block_comment(lex: &mut logos::Lexer<LogosToken>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < rest.len() {
        match (rest[i], rest.get(i + 1)) {
            (b'/', Some(b'*')) => {
                depth += 1;
                i += 2;
            }
            (b'*', Some(b'/')) => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    lex.bump(i);
                    return true;
                }
            }
            _ => i += 1,
        }
    }
    lex.bump(rest.len());
    true
}

/// Quoted string: `~` escapes the next character, a doubled quote stays in
/// the string. Unterminated strings run to the end of input.
fn quoted_string(lex: &mut logos::Lexer<LogosToken>) -> bool {
    let quote = lex.slice().as_bytes()[0];
    let rest = lex.remainder().as_bytes();
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b'~' => i += 2,
            c if c == quote => {
                if rest.get(i + 1) == Some(&quote) {
                    i += 2;
                } else {
                    lex.bump(i + 1);
                    return true;
                }
            }
            _ => i += 1,
        }
    }
    lex.bump(rest.len());
    true
}

/// Brace-delimited reference or include: nested braces and quoted strings
/// are skipped, an unbalanced brace runs to the end of input.
fn brace_block(lex: &mut logos::Lexer<LogosToken>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < rest.len() {
        let c = rest[i];
        match quote {
            Some(q) => {
                if c == b'~' {
                    i += 1;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                b'"' | b'\'' => quote = Some(c),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        lex.bump(i + 1);
                        return true;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    lex.bump(rest.len().min(i));
    true
}

/// Extend a word over `.part` suffixes (`db.table.field`). A dot that is not
/// followed by a word character is left for the next token.
fn qualified_word(lex: &mut logos::Lexer<LogosToken>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut i = 0;
    while rest.get(i) == Some(&b'.') {
        let part = rest[i + 1..].iter().take_while(|c| is_word_byte(**c)).count();
        if part == 0 {
            break;
        }
        i += 1 + part;
    }
    lex.bump(i);
    true
}

fn is_word_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'#' | b'$' | b'%' | b'&')
}

/// Logos token enum - maps to TokenKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\x0c]+")]
    Whitespace,

    #[regex(r"\r\n|\n|\r")]
    Eol,

    #[regex(r"//[^\r\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_\-#$%&]*", qualified_word)]
    Word,

    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_\-]*\$")]
    Snippet,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"[0-9]*\.[0-9]+")]
    Decimal,

    #[regex(r"0[xX][0-9a-fA-F]+")]
    Hex,

    #[token("\"", quoted_string)]
    #[token("'", quoted_string)]
    String,

    // =========================================================================
    // PREPROCESSOR
    // =========================================================================
    #[regex(r"&[a-zA-Z][a-zA-Z0-9_\-]*")]
    Directive,

    #[token("{&", brace_block)]
    #[regex(r"\{[0-9*]", brace_block)]
    PreprocVariable,

    #[token("{", brace_block)]
    Include,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("<>")]
    #[token("<=")]
    #[token(">=")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("::")]
    MultiSymbol,

    #[regex(r"[=<>+\-*/(),\[\]:.^!?@|;~\\}#$%&`]")]
    Symbol,

    /// Non-ASCII text outside strings and comments
    #[regex(r"[^\x00-\x7F]+")]
    Foreign,
}

impl From<LogosToken> for TokenKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => TokenKind::Whitespace,
            LogosToken::Eol => TokenKind::Eol,
            LogosToken::LineComment | LogosToken::BlockComment => TokenKind::Comment,
            LogosToken::Word | LogosToken::Snippet => TokenKind::Word,
            LogosToken::Integer | LogosToken::Decimal | LogosToken::Hex => TokenKind::Number,
            LogosToken::String => TokenKind::String,
            LogosToken::Directive => TokenKind::PreprocDirective,
            LogosToken::PreprocVariable => TokenKind::PreprocVariable,
            LogosToken::Include => TokenKind::Include,
            LogosToken::MultiSymbol | LogosToken::Symbol => TokenKind::Symbol,
            LogosToken::Foreign => TokenKind::Unknown,
        }
    }
}
