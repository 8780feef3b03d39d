//! Preprocessor support: definitions, include calls and `&IF` conditions
//!
//! ```text
//!   {inc.i &mode="fast" 42}       IncludeCall { file, named, positional }
//!   &SCOPED-DEFINE name value     Defines::define_scoped(owner, ...)
//!   &GLOBAL-DEFINE name value     Defines::define_global(...)
//!   &IF DEFINED(name) > 1 &THEN   evaluate_condition(tokens, ...)
//! ```
//!
//! Conditions are evaluated over tokens that were already expanded. Anything
//! the evaluator does not understand counts as true, so unknown code is
//! analysed rather than hidden.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::keywords::abbreviates;
use super::options::PreprocessorEnv;
use super::token::{Token, TokenKind};

// ============================================================================
// DEFINITIONS
// ============================================================================

/// Where a visible definition comes from; the numbers are what `DEFINED()`
/// returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineScope {
    Global = 1,
    Scoped = 2,
    Argument = 3,
}

/// `&GLOBAL-DEFINE` and `&SCOPED-DEFINE` values seen so far in a run.
///
/// Scoped names are keyed by the owner index of the file that defined them
/// and are visible from that file and the files it includes.
#[derive(Debug, Clone, Default)]
pub struct Defines {
    globals: FxHashMap<SmolStr, String>,
    scoped: FxHashMap<(u32, SmolStr), String>,
}

fn key(name: &str) -> SmolStr {
    SmolStr::new(name.to_ascii_lowercase())
}

impl Defines {
    pub fn define_global(&mut self, name: &str, value: impl Into<String>) {
        self.globals.insert(key(name), value.into());
    }

    pub fn define_scoped(&mut self, owner: u32, name: &str, value: impl Into<String>) {
        self.scoped.insert((owner, key(name)), value.into());
    }

    /// Remove the definition visible from `chain` (scoped first). Returns
    /// false when nothing was defined.
    pub fn undefine(&mut self, name: &str, chain: &[u32]) -> bool {
        let name = key(name);
        for owner in chain {
            if self.scoped.remove(&(*owner, name.clone())).is_some() {
                return true;
            }
        }
        self.globals.remove(&name).is_some()
    }

    /// Value visible from the first owner of `chain`.
    pub fn lookup(&self, name: &str, chain: &[u32]) -> Option<(&str, DefineScope)> {
        let name = key(name);
        chain
            .iter()
            .find_map(|owner| self.scoped.get(&(*owner, name.clone())))
            .map(|v| (v.as_str(), DefineScope::Scoped))
            .or_else(|| self.globals.get(&name).map(|v| (v.as_str(), DefineScope::Global)))
    }
}

/// Name inside a reference token: `{&name}` -> `name`, `{1}` -> `1`,
/// `{*}` -> `*`, `{&*}` -> `&*`.
pub fn reference_name(text: &str) -> &str {
    let inner = text.strip_prefix('{').unwrap_or(text);
    let inner = inner.strip_suffix('}').unwrap_or(inner).trim();
    if inner == "&*" {
        return inner;
    }
    inner.strip_prefix('&').unwrap_or(inner).trim()
}

// ============================================================================
// DIRECTIVES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    If,
    ElseIf,
    Else,
    EndIf,
    Then,
    GlobalDefine,
    ScopedDefine,
    Undefine,
    AnalyzeSuspend,
    AnalyzeResume,
    /// `&MESSAGE`: the rest of the line is its text
    Message,
    Other,
}

impl Directive {
    pub fn parse(text: &str) -> Self {
        let upper = text.to_ascii_uppercase();
        match upper.as_str() {
            "&IF" => Self::If,
            "&ELSEIF" => Self::ElseIf,
            "&ELSE" => Self::Else,
            "&ENDIF" => Self::EndIf,
            "&THEN" => Self::Then,
            "&ANALYZE-SUSPEND" => Self::AnalyzeSuspend,
            "&ANALYZE-RESUME" => Self::AnalyzeResume,
            "&MESSAGE" => Self::Message,
            d if abbreviates(d, "&GLOBAL-DEFINE", 5) => Self::GlobalDefine,
            d if abbreviates(d, "&SCOPED-DEFINE", 5) => Self::ScopedDefine,
            d if abbreviates(d, "&UNDEFINE", 6) => Self::Undefine,
            _ => Self::Other,
        }
    }

    /// Directives whose body runs to the end of the line.
    pub fn takes_line(self) -> bool {
        matches!(
            self,
            Self::GlobalDefine
                | Self::ScopedDefine
                | Self::Undefine
                | Self::AnalyzeSuspend
                | Self::AnalyzeResume
                | Self::Message
        )
    }
}

// ============================================================================
// INCLUDE CALLS
// ============================================================================

/// The parts of an include directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeCall {
    pub file: String,
    /// `&name=value` arguments, names lowercased, in order
    pub named: Vec<(SmolStr, String)>,
    pub positional: Vec<String>,
    /// Everything after the file name, as written
    pub raw_args: String,
}

impl IncludeCall {
    /// Split `{file.i &a="x" b}`. Returns `None` when there is no file name.
    pub fn parse(text: &str) -> Option<Self> {
        let inner = text.strip_prefix('{').unwrap_or(text);
        let inner = inner.strip_suffix('}').unwrap_or(inner);
        let words = split_args(inner);
        let (file, rest) = words.split_first()?;
        let mut call = IncludeCall {
            file: unquote(&file.text).to_string(),
            raw_args: inner[file.end..].trim().to_string(),
            ..Default::default()
        };
        let mut rest = rest.iter().peekable();
        while let Some(word) = rest.next() {
            let text = word.text.as_str();
            match text.strip_prefix('&') {
                Some(named) => {
                    let (name, value) = match named.split_once('=') {
                        Some((name, value)) if !value.is_empty() => (name, value.to_string()),
                        Some((name, _)) => (name, rest.next().map(|w| w.text.clone()).unwrap_or_default()),
                        None if rest.peek().is_some_and(|w| w.text.starts_with('=')) => {
                            let eq = rest.next().map(|w| w.text.clone()).unwrap_or_default();
                            let value = match eq.strip_prefix('=') {
                                Some("") | None => rest.next().map(|w| w.text.clone()).unwrap_or_default(),
                                Some(v) => v.to_string(),
                            };
                            (named, value)
                        }
                        None => (named, String::new()),
                    };
                    call.named.push((key(name), unquote(&value).to_string()));
                }
                None => call.positional.push(unquote(text).to_string()),
            }
        }
        Some(call)
    }

    pub fn named(&self, name: &str) -> Option<&str> {
        let name = key(name);
        self.named.iter().find(|(n, _)| *n == name).map(|(_, v)| v.as_str())
    }

    /// `{1}` is the first positional argument.
    pub fn positional(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.positional.get(i))
            .map(String::as_str)
    }

    /// Value of `{&*}`: the named arguments written back out.
    pub fn named_text(&self) -> String {
        self.named
            .iter()
            .map(|(n, v)| format!("&{n}=\"{v}\""))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

struct ArgWord {
    text: String,
    end: usize,
}

/// Whitespace-separated words; quoted runs and nested braces stay whole.
fn split_args(text: &str) -> Vec<ArgWord> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    words.push(ArgWord {
                        text: std::mem::take(&mut current),
                        end: i,
                    });
                }
            }
            None => {
                match c {
                    '"' | '\'' => quote = Some(c),
                    '{' => depth += 1,
                    '}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
                current.push(c);
            }
        }
    }
    if !current.is_empty() {
        words.push(ArgWord {
            text: current,
            end: text.len(),
        });
    }
    words
}

fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text.strip_prefix(quote) {
            return inner.strip_suffix(quote).unwrap_or(inner);
        }
    }
    text
}

// ============================================================================
// CONDITIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i64),
    Dec(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    fn truthy(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Dec(d) => Some(*d != 0.0),
            Value::Str(_) => None,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Dec(d) => Some(*d),
            _ => None,
        }
    }
}

/// Not evaluable; the caller treats the condition as true.
#[derive(Debug)]
struct Unknown;

type Eval<T> = Result<T, Unknown>;

/// Evaluate an `&IF`/`&ELSEIF` condition.
///
/// `defined` answers `DEFINED(name)` with 0 (undefined), 1 (global),
/// 2 (scoped) or 3 (include argument).
pub fn evaluate_condition(tokens: &[Token], env: &PreprocessorEnv, defined: &dyn Fn(&str) -> i64) -> bool {
    let significant: Vec<&Token> = tokens
        .iter()
        .filter(|t| !t.kind.is_trivia() && t.kind != TokenKind::StringDescriptor)
        .collect();
    let mut evaluator = Evaluator {
        tokens: &significant,
        pos: 0,
        env,
        defined,
    };
    let result = evaluator
        .or()
        .and_then(|v| if evaluator.pos == significant.len() { Ok(v) } else { Err(Unknown) })
        .and_then(|v| v.truthy().ok_or(Unknown));
    match result {
        Ok(value) => value,
        Err(Unknown) => {
            tracing::trace!("preprocessor condition not evaluable, assuming true");
            true
        }
    }
}

struct Evaluator<'a> {
    tokens: &'a [&'a Token],
    pos: usize,
    env: &'a PreprocessorEnv,
    defined: &'a dyn Fn(&str) -> i64,
}

impl<'a> Evaluator<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Eval<&'a Token> {
        let token = self.tokens.get(self.pos).copied().ok_or(Unknown)?;
        self.pos += 1;
        Ok(token)
    }

    fn at_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_word(word))
    }

    fn at_symbol(&self, symbol: &str) -> bool {
        self.peek().is_some_and(|t| t.is_symbol(symbol))
    }

    fn expect_symbol(&mut self, symbol: &str) -> Eval<()> {
        if self.at_symbol(symbol) {
            self.pos += 1;
            Ok(())
        } else {
            Err(Unknown)
        }
    }

    fn or(&mut self) -> Eval<Value> {
        let mut left = self.and()?;
        while self.at_word("OR") {
            self.pos += 1;
            let right = self.and()?;
            let value = left.truthy().ok_or(Unknown)? || right.truthy().ok_or(Unknown)?;
            left = Value::Bool(value);
        }
        Ok(left)
    }

    fn and(&mut self) -> Eval<Value> {
        let mut left = self.not()?;
        while self.at_word("AND") {
            self.pos += 1;
            let right = self.not()?;
            let value = left.truthy().ok_or(Unknown)? && right.truthy().ok_or(Unknown)?;
            left = Value::Bool(value);
        }
        Ok(left)
    }

    fn not(&mut self) -> Eval<Value> {
        if self.at_word("NOT") {
            self.pos += 1;
            let value = self.not()?;
            return Ok(Value::Bool(!value.truthy().ok_or(Unknown)?));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Eval<Value> {
        let left = self.additive()?;
        let Some(op) = self.peek().and_then(comparison_op) else {
            return Ok(left);
        };
        self.pos += 1;
        let right = self.additive()?;
        compare(op, &left, &right).map(Value::Bool)
    }

    fn additive(&mut self) -> Eval<Value> {
        let mut left = self.primary()?;
        loop {
            if self.at_symbol("+") {
                self.pos += 1;
                let right = self.primary()?;
                left = match (left, right) {
                    (Value::Str(a), Value::Str(b)) => Value::Str(a + &b),
                    (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(b)),
                    (a, b) => Value::Dec(a.number().ok_or(Unknown)? + b.number().ok_or(Unknown)?),
                };
            } else if self.at_symbol("-") {
                self.pos += 1;
                let right = self.primary()?;
                left = match (left, right) {
                    (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(b)),
                    (a, b) => Value::Dec(a.number().ok_or(Unknown)? - b.number().ok_or(Unknown)?),
                };
            } else {
                return Ok(left);
            }
        }
    }

    fn primary(&mut self) -> Eval<Value> {
        let token = self.bump()?;
        match token.kind {
            TokenKind::Number => parse_number(&token.text),
            TokenKind::String => Ok(Value::Str(string_value(token))),
            TokenKind::Symbol if token.text == "(" => {
                let value = self.or()?;
                self.expect_symbol(")")?;
                Ok(value)
            }
            TokenKind::Symbol if token.text == "-" => match self.primary()? {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Dec(d) => Ok(Value::Dec(-d)),
                _ => Err(Unknown),
            },
            TokenKind::Word => self.word(&token.text.to_ascii_uppercase()),
            _ => Err(Unknown),
        }
    }

    fn word(&mut self, upper: &str) -> Eval<Value> {
        match upper {
            "TRUE" | "YES" => Ok(Value::Bool(true)),
            "FALSE" | "NO" => Ok(Value::Bool(false)),
            "PROVERSION" => Ok(Value::Str(self.env.proversion.clone())),
            "OPSYS" => Ok(Value::Str(self.env.opsys.clone())),
            "WINDOW-SYSTEM" => Ok(Value::Str(self.env.window_system.clone())),
            "BATCH-MODE" => Ok(Value::Bool(self.env.batch_mode)),
            "DEFINED" => {
                self.expect_symbol("(")?;
                let name = self.bump()?;
                if name.kind != TokenKind::Word {
                    return Err(Unknown);
                }
                let level = (self.defined)(&name.text);
                self.expect_symbol(")")?;
                Ok(Value::Int(level))
            }
            _ => Err(Unknown),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Begins,
}

fn comparison_op(token: &Token) -> Option<CompareOp> {
    let op = match token.kind {
        TokenKind::Symbol => match token.text.as_str() {
            "=" => CompareOp::Eq,
            "<>" => CompareOp::Ne,
            "<" => CompareOp::Lt,
            ">" => CompareOp::Gt,
            "<=" => CompareOp::Le,
            ">=" => CompareOp::Ge,
            _ => return None,
        },
        TokenKind::Word => match token.text.to_ascii_uppercase().as_str() {
            "EQ" => CompareOp::Eq,
            "NE" => CompareOp::Ne,
            "LT" => CompareOp::Lt,
            "GT" => CompareOp::Gt,
            "LE" => CompareOp::Le,
            "GE" => CompareOp::Ge,
            "BEGINS" => CompareOp::Begins,
            _ => return None,
        },
        _ => return None,
    };
    Some(op)
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Eval<bool> {
    use std::cmp::Ordering;

    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => {
            let (a, b) = (a.to_lowercase(), b.to_lowercase());
            if op == CompareOp::Begins {
                return Ok(a.starts_with(&b));
            }
            a.cmp(&b)
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (a, b) => {
            let (a, b) = (a.number().ok_or(Unknown)?, b.number().ok_or(Unknown)?);
            a.partial_cmp(&b).ok_or(Unknown)?
        }
    };
    Ok(match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
        CompareOp::Begins => return Err(Unknown),
    })
}

fn parse_number(text: &str) -> Eval<Value> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).map(Value::Int).map_err(|_| Unknown);
    }
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Int(i));
    }
    text.parse::<f64>().map(Value::Dec).map_err(|_| Unknown)
}

/// String literal contents with `~` escapes and doubled quotes resolved.
fn string_value(token: &Token) -> String {
    let text = token.text.as_str();
    let quote = text.chars().next().unwrap_or('"');
    let inner = token.unquoted();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '~' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else if c == quote && chars.peek() == Some(&quote) {
            chars.next();
            out.push(quote);
        } else {
            out.push(c);
        }
    }
    out
}
