//! Token model shared by the lexer, the cursor and the parser.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::base::{Position, Span};

/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier or keyword, possibly qualified (`db.table.field`)
    Word,
    /// Operator or punctuation
    Symbol,
    /// `"..."` or `'...'`
    String,
    /// `:U`, `:L30`... directly after a string
    StringDescriptor,
    Number,
    /// `/* ... */` (nested) or `// ...`
    Comment,
    Whitespace,
    /// Line break (`\n`, `\r\n` or `\r`)
    Eol,
    /// `.` or `:` ending a statement
    Eos,
    /// `{&NAME}`, `{1}`, `{*}`
    PreprocVariable,
    /// `&IF`, `&GLOBAL-DEFINE`...
    PreprocDirective,
    /// `{file.i args}`
    Include,
    Unknown,
    Eof,
}

impl TokenKind {
    /// Tokens that carry no meaning for statement analysis.
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment | Self::Eol)
    }
}

/// A token with its text and position.
///
/// Tokens are owned so that the parser can splice tokens coming from
/// included files and preprocessor values into the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
    /// 0-based line in the file that produced the token
    pub line: u32,
    /// 0-based column (in characters)
    pub column: u32,
    /// Byte range in the file that produced the token
    pub range: TextRange,
    /// Index in the include chain: 0 for the parsed file, N for the Nth include
    pub owner: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<SmolStr>, line: u32, column: u32, range: TextRange) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
            range,
            owner: 0,
        }
    }

    /// An end-of-file token at the given position.
    pub fn eof(line: u32, column: u32, offset: TextSize) -> Self {
        Self::new(TokenKind::Eof, "", line, column, TextRange::empty(offset))
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Case-insensitive comparison of a word, symbol or directive text.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(word)
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == symbol
    }

    pub fn is_directive(&self, directive: &str) -> bool {
        self.kind == TokenKind::PreprocDirective && self.text.eq_ignore_ascii_case(directive)
    }

    /// 1-based line for messages.
    pub fn display_line(&self) -> u32 {
        self.line + 1
    }

    pub fn start(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Lines and columns covered by the token text in its own file.
    pub fn span(&self) -> Span {
        Span::of_text(self.start(), &self.text)
    }

    /// Text with surrounding quotes removed when the token is a string.
    pub fn unquoted(&self) -> &str {
        if self.kind != TokenKind::String {
            return &self.text;
        }
        let text = self.text.as_str();
        let quote = match text.chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return text,
        };
        let inner = &text[1..];
        inner.strip_suffix(quote).unwrap_or(inner)
    }

    /// Same token re-attributed to another owner.
    pub fn with_owner(mut self, owner: u32) -> Self {
        self.owner = owner;
        self
    }
}
