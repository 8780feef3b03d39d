//! Plain-text dumps of a parse, for logs and bug reports.
//!
//! ```text
//! items:
//!   0 file           <root>          line 1
//!   1 procedure      main            line 1..3   in 0
//! lines:
//!   1  file > procedure
//! errors:
//!   line 5  unexpected block end (depth 1)
//! ```

use std::fmt::Write;

use crate::parser::{ParseResult, ScopeKind, Token};

fn scope_name(kind: ScopeKind) -> &'static str {
    match kind {
        ScopeKind::File => "file",
        ScopeKind::Procedure => "procedure",
        ScopeKind::Function => "function",
        ScopeKind::Method => "method",
        ScopeKind::Trigger => "trigger",
        ScopeKind::PreprocIf => "&if",
        ScopeKind::PreprocSuspend => "suspend",
        ScopeKind::Block => "block",
    }
}

/// One line per item: id, variant, name, 1-based lines, parent scope.
pub fn dump_items(result: &ParseResult) -> String {
    let mut out = String::new();
    for item in &result.items {
        let name = if item.name.is_empty() { "<root>" } else { item.name.as_str() };
        let _ = write!(out, "{:>4} {:<20} {:<24} line {}", item.id.0, item.kind.as_str(), name, item.root_line + 1);
        if let Some(end) = item.end_line {
            let _ = write!(out, "..{}", end + 1);
        }
        if let Some(scope) = item.scope {
            let _ = write!(out, "   in {}", scope.0);
        }
        if item.owner() != 0 {
            let _ = write!(out, "   from include {}", item.owner());
        }
        out.push('\n');
    }
    out
}

/// One line per root-file line: the open scopes, outermost first.
pub fn dump_line_info(result: &ParseResult) -> String {
    let mut out = String::new();
    for (line, info) in result.line_info.iter().enumerate() {
        let frames: Vec<&str> = info.scope.iter().map(|f| scope_name(f.kind)).collect();
        let _ = write!(out, "{:>5}  {}", line + 1, frames.join(" > "));
        if info.in_false_branch {
            out.push_str("  (inactive)");
        }
        out.push('\n');
    }
    out
}

pub fn dump_errors(result: &ParseResult) -> String {
    let mut out = String::new();
    for error in &result.errors {
        let _ = writeln!(out, "{error}");
    }
    out
}

/// `line:column kind "text"` per token, with the owner for included tokens.
pub fn dump_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        let _ = write!(out, "{}:{} {:?} {:?}", token.display_line(), token.column + 1, token.kind, token.text.as_str());
        if token.owner != 0 {
            let _ = write!(out, " @{}", token.owner);
        }
        out.push('\n');
    }
    out
}

/// Items, line info and errors in one report.
pub fn dump(result: &ParseResult) -> String {
    let mut out = String::new();
    if let Some(path) = &result.path {
        let _ = writeln!(out, "file: {}", path.display());
    }
    out.push_str("items:\n");
    out.push_str(&dump_items(result));
    out.push_str("lines:\n");
    out.push_str(&dump_line_info(result));
    out.push_str("errors:\n");
    out.push_str(&dump_errors(result));
    out
}
