//! Preprocessor directives
//!
//! A directive reads its operands straight from the token stream ahead of
//! the cursor and sets `skip`, so the main loop passes over them without
//! analysis. Conditional branches are frames on the scope stack:
//!
//! ```text
//!   &IF a &THEN        push PreprocIf { active: a, taken: a }
//!   &ELSEIF b &THEN    active = !taken && b, taken |= active
//!   &ELSE              active = !taken, taken = true
//!   &ENDIF             remove the nearest PreprocIf frame
//! ```
//!
//! Nothing is expanded or analysed while any `&IF` frame is inactive.

use smol_str::SmolStr;

use super::cursor::Ahead;
use super::errors::{AnalyzeFault, ParserErrorKind};
use super::items::{ItemKind, PreprocBlockItem, PreprocVariableItem};
use super::parser::Parser;
use super::preprocessor::{evaluate_condition, Directive};
use super::scope::Scope;
use super::token::{Token, TokenKind};

/// Operand tokens of a directive and how many stream tokens they span.
struct Operands {
    tokens: Vec<Token>,
    count: usize,
}

impl Operands {
    fn significant(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| !t.kind.is_trivia())
    }

    /// Text after the first significant token, comments dropped.
    fn text_after_first(&self) -> String {
        let Some(first) = self.tokens.iter().position(|t| !t.kind.is_trivia()) else {
            return String::new();
        };
        let text: String = self.tokens[first + 1..]
            .iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .map(|t| if t.kind == TokenKind::Eol { " " } else { t.text.as_str() })
            .collect();
        text.trim().to_string()
    }
}

impl Parser<'_> {
    pub(super) fn directive(&mut self, token: &Token) -> Result<(), AnalyzeFault> {
        let directive = Directive::parse(&token.text);
        match directive {
            Directive::If => self.preproc_if(token),
            Directive::ElseIf => self.preproc_else_if(token),
            Directive::Else => self.preproc_else(token),
            Directive::EndIf => self.preproc_end_if(token),
            Directive::Then | Directive::Other => {}
            d if d.takes_line() && self.ctx.stack.in_false_branch() => {
                self.ctx.skip = self.read_line(false).count;
            }
            Directive::GlobalDefine | Directive::ScopedDefine => {
                self.preproc_define(token, directive == Directive::GlobalDefine)?;
            }
            Directive::Undefine => self.preproc_undefine(token)?,
            Directive::AnalyzeSuspend => self.analyze_suspend(token),
            Directive::AnalyzeResume => self.analyze_resume(token)?,
            Directive::Message => {
                let operands = self.read_line(false);
                self.ctx.skip = operands.count;
                tracing::debug!(line = token.display_line(), message = %operands.text_after_first(), "&MESSAGE");
            }
        }
        Ok(())
    }

    // ========================================================================
    // OPERANDS
    // ========================================================================

    /// Tokens up to `&THEN`, which is counted; another directive or the end
    /// of input stops the condition without being counted.
    fn read_condition(&mut self, expand: bool) -> Operands {
        let mut tokens = Vec::new();
        let mut distance = 1;
        let count = loop {
            let Some(ahead) = Ahead::new(distance) else {
                break 0;
            };
            if expand {
                self.expand_at(ahead, false);
            }
            let token = self.cursor.peek_ahead(ahead);
            if token.is_eof() {
                break distance - 1;
            }
            if token.kind == TokenKind::PreprocDirective {
                break if Directive::parse(&token.text) == Directive::Then {
                    distance
                } else {
                    distance - 1
                };
            }
            tokens.push(token.clone());
            distance += 1;
        };
        Operands { tokens, count }
    }

    /// Tokens up to the end of the line; `~` before a line break continues
    /// the line.
    fn read_line(&mut self, expand: bool) -> Operands {
        let mut tokens = Vec::new();
        let mut distance = 1;
        loop {
            let Some(ahead) = Ahead::new(distance) else {
                break;
            };
            if expand {
                self.expand_at(ahead, false);
            }
            let token = self.cursor.peek_ahead(ahead);
            if token.is_eof() || token.kind == TokenKind::Eol {
                break;
            }
            if token.is_symbol("~") && self.cursor.peek_ahead(ahead.next()).kind == TokenKind::Eol {
                let eol = self.cursor.peek_ahead(ahead.next()).clone();
                tokens.push(eol);
                distance += 2;
                continue;
            }
            tokens.push(token.clone());
            distance += 1;
        }
        Operands {
            tokens,
            count: distance - 1,
        }
    }

    fn evaluate(&self, condition: &[Token], owner: u32) -> bool {
        let defined = |name: &str| self.defined_level(name, owner);
        evaluate_condition(condition, &self.env.options.preprocessor, &defined)
    }

    // ========================================================================
    // CONDITIONALS
    // ========================================================================

    fn preproc_if(&mut self, token: &Token) {
        let live = !self.ctx.stack.in_false_branch();
        let condition = self.read_condition(live);
        self.ctx.skip = condition.count;
        let value = live && self.evaluate(&condition.tokens, token.owner);
        tracing::trace!(line = token.display_line(), value, "&IF");
        self.ctx.push_scope(
            Scope::PreprocIf {
                opener: token.clone(),
                branch_taken: value,
                active: value,
            },
            token,
        );
    }

    /// Index of the nearest `&IF` frame and whether one of its branches was
    /// already taken.
    fn nearest_if(&self) -> Option<(usize, bool)> {
        let index = self
            .ctx
            .stack
            .position_from_top(|s| matches!(s, Scope::PreprocIf { .. }))?;
        match self.ctx.stack.iter().nth(index) {
            Some(Scope::PreprocIf { branch_taken, .. }) => Some((index, *branch_taken)),
            _ => None,
        }
    }

    fn set_branch(&mut self, index: usize, value: bool, taken: bool) {
        if let Some(Scope::PreprocIf {
            branch_taken, active, ..
        }) = self.ctx.stack.get_mut(index)
        {
            *active = value;
            *branch_taken |= taken;
        }
    }

    fn preproc_else_if(&mut self, token: &Token) {
        let Some((index, taken)) = self.nearest_if() else {
            self.ctx.skip = self.read_condition(false).count;
            self.ctx.error(ParserErrorKind::UnexpectedPreprocDirective, token);
            return;
        };
        let live = self.ctx.stack.active_below(index) && !taken;
        let condition = self.read_condition(live);
        self.ctx.skip = condition.count;
        let value = live && self.evaluate(&condition.tokens, token.owner);
        self.set_branch(index, value, value);
    }

    fn preproc_else(&mut self, token: &Token) {
        let Some((index, taken)) = self.nearest_if() else {
            self.ctx.error(ParserErrorKind::UnexpectedPreprocDirective, token);
            return;
        };
        let value = self.ctx.stack.active_below(index) && !taken;
        self.set_branch(index, value, true);
    }

    fn preproc_end_if(&mut self, token: &Token) {
        match self.nearest_if() {
            Some((index, _)) => {
                self.ctx.stack.remove(index);
            }
            None => self.ctx.error(ParserErrorKind::UnexpectedPreprocDirective, token),
        }
    }

    // ========================================================================
    // DEFINITIONS
    // ========================================================================

    fn preproc_define(&mut self, token: &Token, global: bool) -> Result<(), AnalyzeFault> {
        let operands = self.read_line(true);
        self.ctx.skip = operands.count;
        let Some(name) = operands.significant().next().cloned() else {
            return Err(AnalyzeFault::MissingName {
                keyword: token.text.clone(),
                line: token.display_line(),
            });
        };
        let value = operands.text_after_first();
        if global {
            self.ctx.defines.define_global(&name.text, value.as_str());
        } else {
            self.ctx.defines.define_scoped(name.owner, &name.text, value.as_str());
        }
        self.ctx.add_item(
            name.text.clone(),
            &name,
            ItemKind::PreprocVariable(PreprocVariableItem {
                value,
                global,
                undefine: false,
            }),
        );
        Ok(())
    }

    fn preproc_undefine(&mut self, token: &Token) -> Result<(), AnalyzeFault> {
        let operands = self.read_line(false);
        self.ctx.skip = operands.count;
        let Some(name) = operands.significant().next().cloned() else {
            return Err(AnalyzeFault::MissingName {
                keyword: token.text.clone(),
                line: token.display_line(),
            });
        };
        let chain = self.ctx.owner_chain(name.owner);
        if !self.ctx.defines.undefine(&name.text, &chain) {
            tracing::trace!(name = %name.text, "&UNDEFINE of an unknown name");
        }
        self.ctx.add_item(
            name.text.clone(),
            &name,
            ItemKind::PreprocVariable(PreprocVariableItem {
                value: String::new(),
                global: false,
                undefine: true,
            }),
        );
        Ok(())
    }

    // ========================================================================
    // ANALYZE-SUSPEND / ANALYZE-RESUME
    // ========================================================================

    fn analyze_suspend(&mut self, token: &Token) {
        let operands = self.read_line(false);
        self.ctx.skip = operands.count;
        let block_type = operands
            .significant()
            .next()
            .map(|t| t.text.clone())
            .unwrap_or_default();
        let description = operands.text_after_first();
        let name = if description.is_empty() {
            block_type.clone()
        } else {
            SmolStr::new(&description)
        };
        let item = self.ctx.add_item(
            name,
            token,
            ItemKind::PreprocBlock(PreprocBlockItem {
                block_type,
                description,
            }),
        );
        self.ctx.push_scope(
            Scope::PreprocSuspend {
                item,
                opener: token.clone(),
            },
            token,
        );
    }

    fn analyze_resume(&mut self, token: &Token) -> Result<(), AnalyzeFault> {
        self.ctx.skip = self.read_line(false).count;
        let index = self
            .ctx
            .stack
            .position_from_top(|s| matches!(s, Scope::PreprocSuspend { .. }));
        let Some(index) = index else {
            self.ctx.error(ParserErrorKind::UnexpectedSuspendEnd, token);
            return Ok(());
        };
        let (scope, _) = self.ctx.stack.remove(index);
        if let Some(item) = scope.item() {
            let line = self.ctx.root_line(token);
            self.ctx.set_end_line(item, line)?;
        }
        Ok(())
    }
}
