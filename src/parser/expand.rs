//! Token expansion ahead of the cursor
//!
//! ```text
//!   cursor   ahead
//!     v        v
//!   [ .. DISPLAY {&x} . ]      {&x} -> tokens of its value, spliced in place
//!   [ .. {inc.i a} DO ..  ]    include token kept, file tokens inserted after it
//! ```
//!
//! A substituted value is expanded again at the same position, so values
//! may refer to other values; `max_expansion_depth` bounds the rounds. An
//! include is never expanded twice: `expanded_through` records the highest
//! position already handled.

use smol_str::SmolStr;

use super::cursor::Ahead;
use super::items::{IncludeFileItem, ItemKind, PreprocVariableUseItem};
use super::lexer::{tokenize, tokenize_fragment};
use super::parser::{IncludeEntry, Parser};
use super::preprocessor::{reference_name, DefineScope, IncludeCall};
use super::token::{Token, TokenKind};

/// Place a value token at the reference it replaces.
fn retag(mut token: Token, at: &Token) -> Token {
    if token.kind == TokenKind::Eol {
        token.kind = TokenKind::Whitespace;
        token.text = SmolStr::new_static(" ");
    }
    token.line = at.line;
    token.column = at.column;
    token.range = at.range;
    token.owner = at.owner;
    token
}

impl Parser<'_> {
    /// Expand the token `ahead` of the cursor: substitute `{&name}` references
    /// until something else is there, then expand an include when `includes`
    /// is set.
    pub(super) fn expand_at(&mut self, ahead: Ahead, includes: bool) {
        let index = self.cursor.absolute_ahead(ahead);
        if self.ctx.expanded_through.is_some_and(|done| index <= done) {
            return;
        }

        let mut rounds = 0;
        loop {
            let token = self.cursor.peek_ahead(ahead).clone();
            match token.kind {
                TokenKind::PreprocVariable => {
                    if rounds >= self.env.options.max_expansion_depth {
                        tracing::debug!(
                            reference = %token.text,
                            line = token.display_line(),
                            "expansion depth reached, reference left as is"
                        );
                        break;
                    }
                    // An empty value brings the next sibling into place, which
                    // is not a deeper expansion.
                    if self.substitute(ahead, &token) > 0 {
                        rounds += 1;
                    }
                }
                TokenKind::Include if includes => {
                    self.include(ahead, &token);
                    break;
                }
                _ => break,
            }
        }

        if includes {
            self.ctx.expanded_through = Some(self.ctx.expanded_through.map_or(index, |done| done.max(index)));
        }
    }

    /// Replace the reference `ahead` by the tokens of its value, returning
    /// how many tokens took its place.
    fn substitute(&mut self, ahead: Ahead, token: &Token) -> usize {
        let name = reference_name(&token.text).to_string();
        let value = self.reference_value(&name, token);
        self.ctx.add_item(
            name.as_str(),
            token,
            ItemKind::PreprocVariableUse(PreprocVariableUseItem {
                defined: value.is_some(),
            }),
        );
        let tokens: Vec<Token> = tokenize_fragment(value.as_deref().unwrap_or_default(), token.owner)
            .into_iter()
            .map(|t| retag(t, token))
            .collect();
        let count = tokens.len();
        self.cursor.splice(ahead, tokens);
        count
    }

    /// Value of a reference seen in the file `at.owner`; `None` when nothing
    /// defines it (it then expands to nothing).
    pub(super) fn reference_value(&mut self, name: &str, at: &Token) -> Option<String> {
        let owner = at.owner;
        let entry = self.ctx.includes.get(owner as usize)?;
        match name {
            "*" => return Some(entry.args.raw_args.clone()),
            "&*" => return Some(entry.args.named_text()),
            "0" => return Some(entry.name.to_string()),
            n if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => {
                let index = n.parse::<usize>().ok()?;
                return entry.args.positional(index).map(str::to_string);
            }
            _ => {}
        }

        let chain = self.ctx.owner_chain(owner);
        if let Some(value) = self.argument(name, &chain) {
            return Some(value.to_string());
        }
        if let Some((value, _)) = self.ctx.defines.lookup(name, &chain) {
            return Some(value.to_string());
        }
        self.builtin_value(name, at)
    }

    /// Named include argument visible along `chain`.
    fn argument(&self, name: &str, chain: &[u32]) -> Option<&str> {
        chain
            .iter()
            .filter_map(|owner| self.ctx.includes.get(*owner as usize))
            .find_map(|entry| entry.args.named(name))
    }

    fn builtin_value(&mut self, name: &str, at: &Token) -> Option<String> {
        let env = &self.env.options.preprocessor;
        let value = match name.to_ascii_uppercase().as_str() {
            "FILE-NAME" => {
                let entry = self.ctx.includes.get(at.owner as usize)?;
                entry
                    .path
                    .as_ref()
                    .map_or_else(|| entry.name.to_string(), |p| p.display().to_string())
            }
            "LINE-NUMBER" => at.display_line().to_string(),
            "SEQUENCE" => {
                let value = self.ctx.sequence;
                self.ctx.sequence += 1;
                value.to_string()
            }
            "OPSYS" => env.opsys.clone(),
            "WINDOW-SYSTEM" => env.window_system.clone(),
            "BATCH-MODE" => if env.batch_mode { "yes" } else { "no" }.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// `DEFINED(name)`: 3 for an include argument, 2 for a scoped definition,
    /// 1 for a global one, 0 otherwise.
    pub(super) fn defined_level(&self, name: &str, owner: u32) -> i64 {
        let chain = self.ctx.owner_chain(owner);
        if self.argument(name, &chain).is_some() {
            return DefineScope::Argument as i64;
        }
        self.ctx
            .defines
            .lookup(name, &chain)
            .map_or(0, |(_, scope)| scope as i64)
    }

    /// Resolve, load and insert an include file right after its directive.
    fn include(&mut self, ahead: Ahead, token: &Token) {
        let depth = self.ctx.owner_chain(token.owner).len();
        if depth > self.env.options.max_include_depth {
            tracing::debug!(include = %token.text, depth, "include depth reached, not expanded");
            return;
        }
        let Some(call) = IncludeCall::parse(&token.text) else {
            return;
        };

        let including = self
            .ctx
            .includes
            .get(token.owner as usize)
            .and_then(|entry| entry.path.as_deref());
        let resolved = self.env.resolver.resolve_include(&call.file, including);
        let loaded = resolved.as_ref().and_then(|path| {
            if let Some(tokens) = self.env.includes.get(path) {
                return Some(tokens);
            }
            match self.env.resolver.load(path) {
                Ok(text) => Some(self.env.includes.insert(path.clone(), tokenize(&text))),
                Err(err) => {
                    tracing::debug!(path = %path.display(), %err, "include not readable");
                    None
                }
            }
        });

        let Some(tokens) = loaded else {
            if resolved.is_none() {
                tracing::debug!(file = %call.file, line = token.display_line(), "include not found");
            }
            self.ctx.add_item(
                call.file.as_str(),
                token,
                ItemKind::IncludeFile(IncludeFileItem {
                    path: resolved,
                    owner: None,
                }),
            );
            return;
        };

        let owner = self.ctx.includes.len() as u32;
        let root_line = self.ctx.root_line(token);
        let file = call.file.clone();
        self.ctx.includes.push(
            IncludeEntry::new(file.as_str(), resolved.clone(), token.clone(), token.owner, root_line).with_args(call),
        );
        self.ctx.add_item(
            file.as_str(),
            token,
            ItemKind::IncludeFile(IncludeFileItem {
                path: resolved,
                owner: Some(owner),
            }),
        );
        tracing::trace!(file = %file, owner, tokens = tokens.len(), "include expanded");
        self.cursor.insert(
            ahead.next(),
            tokens
                .iter()
                .filter(|t| !t.is_eof())
                .cloned()
                .map(|t| t.with_owner(owner)),
        );
    }
}
