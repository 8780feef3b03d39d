/// Position tracking for tokens and parsed items
///
/// Stores the source location (line/column) of tokens for outline, error
/// reporting and document links.
/// A span representing a range in source code (0-indexed for LSP compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// A position in source code (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Span {
    /// Span covering `text` when it starts at `start`.
    ///
    /// Multi-line text (block comments, strings, include arguments) ends on
    /// a later line.
    pub fn of_text(start: Position, text: &str) -> Self {
        Self {
            start,
            end: start.advanced_past(text),
        }
    }
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The position just after `text` when it starts here. `\r\n`, `\r`
    /// and `\n` each end a line; columns count characters.
    pub fn advanced_past(self, text: &str) -> Self {
        let mut end = self;
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '\r' => {
                    chars.next_if_eq(&'\n');
                    end.line += 1;
                    end.column = 0;
                }
                '\n' => {
                    end.line += 1;
                    end.column = 0;
                }
                _ => end.column += 1,
            }
        }
        end
    }
}
