//! Statement analysis
//!
//! Significant tokens are collected into the current [`Statement`]; each
//! word is also checked on its own (function calls, table uses, snippets,
//! unknown words). When the statement ends, its first word decides what it
//! declares or opens:
//!
//! ```text
//!   PROCEDURE p:            Procedure item, Routine scope
//!   FUNCTION f RETURNS ...  Prototype (. / FORWARD / IN) or Implementation (:)
//!   METHOD ... m():         Method item, Routine scope
//!   ON ev OF w DO:          On item, Trigger scope
//!   RUN target ...          Run item
//!   DEFINE ... / VAR ...    Define, Buffer or Event items
//!   label:                  Label, attached to the next block
//!   DO: FOR ...: CASE ...:  Block scope
//!   END [kind].             closes the nearest block or routine
//! ```

use smol_str::SmolStr;

use super::context::{FunctionEntry, Statement, StatementPart};
use super::cursor::TRIVIA;
use super::errors::{AnalyzeFault, ParserErrorKind};
use super::items::{
    BufferItem, DefineItem, FunctionCallItem, ImplementationItem, ItemId, ItemKind, LabelItem, MethodItem,
    MethodKind, OnItem, ProcedureItem, PrototypeItem, RunItem, TableUseItem,
};
use super::keywords::{
    abbreviates, DefineType, StatementKind, DEFINE_MODIFIERS, METHOD_MODIFIERS, ON_ACTION_WORDS,
    STATEMENT_RESTART_WORDS,
};
use super::parser::Parser;
use super::scope::{RoutineKind, Scope};
use super::token::{Token, TokenKind};
use crate::project::{PrimitiveType, SymbolKind};

fn lower(text: &str) -> SmolStr {
    SmolStr::new(text.to_ascii_lowercase())
}

fn missing_name(statement: &Statement) -> AnalyzeFault {
    let keyword = statement.first().map(|t| t.text.clone()).unwrap_or_default();
    let line = statement.first().map_or(0, Token::display_line);
    AnalyzeFault::MissingName { keyword, line }
}

/// Name token at `index`: a word or a quoted string.
fn name_at(statement: &Statement, index: usize) -> Result<(&Token, SmolStr), AnalyzeFault> {
    match statement.token(index) {
        Some(token) if matches!(token.kind, TokenKind::Word | TokenKind::String) => {
            Ok((token, SmolStr::new(token.unquoted())))
        }
        _ => Err(missing_name(statement)),
    }
}

/// Index of `word` outside any parentheses.
fn find_top_level(statement: &Statement, word: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, part) in statement.parts.iter().enumerate() {
        let token = &part.token;
        if token.is_symbol("(") {
            depth += 1;
        } else if token.is_symbol(")") {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && token.is_word(word) {
            return Some(i);
        }
    }
    None
}

/// The `GET`, `SET` or `TRIGGERS` word ending a property statement, alone
/// or followed by one parameter group: `GET:`, `GET():`, `SET(INPUT v AS CHARACTER):`.
fn accessor_opener(statement: &Statement) -> Option<&Token> {
    let mut end = statement.parts.len().checked_sub(1)?;
    if statement.token(end)?.is_symbol(")") {
        let mut depth = 0usize;
        loop {
            let token = statement.token(end)?;
            if token.is_symbol(")") {
                depth += 1;
            } else if token.is_symbol("(") {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            end = end.checked_sub(1)?;
        }
        end = end.checked_sub(1)?;
    }
    let token = statement.token(end)?;
    ["GET", "SET", "TRIGGERS"].iter().any(|k| token.is_word(k)).then_some(token)
}

/// `table` of `db.table`.
fn unqualified(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, table)| table)
}

/// Type name after `AS` or `RETURNS`, skipping `CLASS`.
fn type_after(statement: &Statement, index: usize) -> Option<SmolStr> {
    let mut token = statement.token(index + 1)?;
    if token.is_word("CLASS") {
        token = statement.token(index + 2)?;
    }
    Some(token.text.clone())
}

fn is_snippet(text: &str) -> bool {
    text.len() > 2 && text.starts_with('$') && text.ends_with('$')
}

impl Parser<'_> {
    // ========================================================================
    // TOKENS OF A STATEMENT
    // ========================================================================

    /// Add a significant token to the current statement.
    pub(super) fn statement_token(&mut self, token: &Token) -> Result<(), AnalyzeFault> {
        let spaced = std::mem::take(&mut self.ctx.spaced);

        if token.kind == TokenKind::Word {
            if self.ctx.starts_statement(token) {
                let on_item = (!self.ctx.statement.is_empty())
                    .then_some(self.ctx.statement.on_item)
                    .flatten();
                self.start_statement(token, on_item);
            } else if self.is_on_action(token) {
                let on = self.on_item()?;
                self.start_statement(token, Some(on));
            }
            let upper = token.text.to_ascii_uppercase();
            self.ctx.read_next_word_as_statement_start = STATEMENT_RESTART_WORDS.contains(&upper.as_str());
            self.word(token, spaced)?;
            self.ctx.statement.word_count += 1;
        }

        self.ctx.statement.parts.push(StatementPart {
            token: token.clone(),
            spaced,
        });
        Ok(())
    }

    fn start_statement(&mut self, token: &Token, on_item: Option<ItemId>) {
        let kind = StatementKind::classify(&token.text);
        tracing::trace!(word = %token.text, ?kind, line = token.display_line(), "statement");
        self.ctx.statement = Statement {
            kind,
            parts: Vec::new(),
            word_count: 0,
            unknown_first_word: self.directory.classify(&token.text).is_none(),
            on_item,
        };
    }

    /// Inside `ON event OF widget` (or `ON event ANYWHERE`), an action word
    /// starts the trigger body.
    fn is_on_action(&self, token: &Token) -> bool {
        let statement = &self.ctx.statement;
        if statement.kind != StatementKind::On || statement.on_item.is_some() || statement.parts.len() < 2 {
            return false;
        }
        let upper = token.text.to_ascii_uppercase();
        if !ON_ACTION_WORDS.contains(&upper.as_str()) {
            return false;
        }
        upper == "DO" || statement.has_word("OF") || statement.has_word("ANYWHERE")
    }

    /// Create the On item for the current `ON` statement.
    fn on_item(&mut self) -> Result<ItemId, AnalyzeFault> {
        let statement = &self.ctx.statement;
        let first = statement.first().cloned().ok_or_else(|| missing_name(statement))?;
        let of = statement.find_word("OF");
        let anywhere = statement.find_word("ANYWHERE");
        let events_end = of.or(anywhere).unwrap_or(statement.parts.len());
        let join = |parts: &[StatementPart]| {
            parts
                .iter()
                .map(|p| p.token.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        };
        let events = join(&statement.parts[1.min(events_end)..events_end]);
        let widgets = match of {
            Some(of) => join(&statement.parts[of + 1..]),
            None => String::new(),
        };
        let name = if widgets.is_empty() {
            events.clone()
        } else {
            format!("{events} OF {widgets}")
        };
        let id = self.ctx.add_item(
            name,
            &first,
            ItemKind::OnStatement(OnItem {
                events: events.into(),
                widgets: widgets.into(),
                has_block: false,
            }),
        );
        self.ctx.last_on_block = Some(id);
        Ok(id)
    }

    // ========================================================================
    // WORDS
    // ========================================================================

    fn word(&mut self, token: &Token, spaced: bool) -> Result<(), AnalyzeFault> {
        if is_snippet(&token.text) {
            self.ctx.add_item(token.text.clone(), token, ItemKind::Snippet);
            return Ok(());
        }
        if token.is_word("DYNAMIC-FUNCTION") {
            return self.dynamic_function(token);
        }
        if self.is_function_call(token, spaced) {
            let key = lower(&token.text);
            let defined_in_file = self.ctx.functions.contains_key(&key);
            self.ctx.add_item(
                token.text.clone(),
                token,
                ItemKind::FunctionCall(FunctionCallItem {
                    defined_in_file,
                    dynamic: false,
                }),
            );
            return Ok(());
        }

        let kind = self.directory.classify(&token.text);
        self.table_use(token, kind);

        if self.env.options.match_known_words && kind.is_none() {
            let key = lower(&token.text);
            if !self.ctx.seen_words.contains(&key) {
                self.ctx.seen_words.insert(key);
                self.ctx.add_item(token.text.clone(), token, ItemKind::Word);
            }
        }
        Ok(())
    }

    fn is_function_call(&self, token: &Token, spaced: bool) -> bool {
        if !self.cursor.peek_significant().is_symbol("(") {
            return false;
        }
        let previous = self.cursor.peek_significant_back();
        if previous.is_symbol(":") || previous.is_word("NEW") {
            return false;
        }
        let statement = &self.ctx.statement;
        if statement.kind.is_header() || statement.in_run_target(spaced) {
            return false;
        }
        self.ctx.functions.contains_key(&lower(&token.text)) || !self.directory.is_keyword(&token.text)
    }

    /// `DYNAMIC-FUNCTION("name" ...)`
    fn dynamic_function(&mut self, token: &Token) -> Result<(), AnalyzeFault> {
        let (offset, open) = self.cursor.peek_next_not_of_kind(0, &TRIVIA, false);
        if !open.is_symbol("(") {
            return Ok(());
        }
        let (_, name) = self.cursor.peek_next_not_of_kind(offset, &TRIVIA, false);
        if name.kind != TokenKind::String {
            return Ok(());
        }
        let name = name.clone();
        let defined_in_file = self.ctx.functions.contains_key(&lower(name.unquoted()));
        self.ctx.add_item(
            name.unquoted(),
            token,
            ItemKind::FunctionCall(FunctionCallItem {
                defined_in_file,
                dynamic: true,
            }),
        );
        Ok(())
    }

    /// Table named directly, through a field (`customer.name`), or defined
    /// in the file. Reported once per scope.
    fn table_use(&mut self, token: &Token, kind: Option<SymbolKind>) {
        let (table, temp_table) = match kind {
            Some(SymbolKind::Table) => (token.text.as_str(), false),
            Some(SymbolKind::TableField | SymbolKind::PrimaryKeyField) => match token.text.rsplit_once('.') {
                Some((table, _)) => (table, false),
                None => return,
            },
            _ => match self.ctx.local_tables.get(&lower(&token.text)) {
                Some(temp) => (token.text.as_str(), *temp),
                None => return,
            },
        };
        let table = unqualified(table);
        let scope = self.ctx.scope_item();
        if self.ctx.table_uses.insert((scope, lower(table))) {
            self.ctx
                .add_item(table, token, ItemKind::TableUse(TableUseItem { temp_table }));
        }
    }

    // ========================================================================
    // STATEMENT END
    // ========================================================================

    /// Analyse a statement closed by `eos` (`.`, `:`, or end of input).
    pub(super) fn end_statement(&mut self, statement: Statement, eos: &Token) -> Result<(), AnalyzeFault> {
        let colon = eos.text == ":";
        let mut keeps_label = false;
        // Items of a restarted `ON ... RUN x.` belong to the trigger.
        let outer_on = std::mem::replace(&mut self.ctx.statement.on_item, statement.on_item);
        let result = match statement.kind {
            StatementKind::Procedure => self.procedure(&statement),
            StatementKind::Function => self.function(&statement, colon),
            StatementKind::Method | StatementKind::Constructor | StatementKind::Destructor => {
                self.method(&statement, colon)
            }
            StatementKind::On => self.on_statement(&statement),
            StatementKind::Run => self.run_statement(&statement),
            StatementKind::Define => self.define(&statement, colon),
            StatementKind::Var => self.var(&statement),
            StatementKind::End => self.end(&statement),
            StatementKind::Block => self.block(&statement),
            StatementKind::Accessor if colon => self.block(&statement),
            StatementKind::Accessor => Ok(()),
            StatementKind::Other => {
                keeps_label = colon && self.label(&statement)?;
                Ok(())
            }
        };
        self.ctx.statement.on_item = outer_on;
        if !keeps_label {
            self.ctx.pending_label = None;
        }
        result
    }

    /// Push a routine scope, reporting a routine opened inside another one.
    fn open_routine(&mut self, item: ItemId, kind: RoutineKind, keyword: &str, opener: &Token) {
        if self.ctx.stack.open_routines() > 0 {
            self.ctx.error(ParserErrorKind::NestedRoutine, opener);
        }
        self.ctx.push_scope(
            Scope::Routine {
                item,
                kind,
                keyword: SmolStr::new(keyword),
                opener: opener.clone(),
            },
            opener,
        );
    }

    fn procedure(&mut self, statement: &Statement) -> Result<(), AnalyzeFault> {
        let opener = statement.first().cloned().ok_or_else(|| missing_name(statement))?;
        let (name_token, name) = name_at(statement, 1)?;
        let name_token = name_token.clone();
        let external = statement
            .find_word("EXTERNAL")
            .and_then(|i| statement.word_after(i))
            .map(|t| SmolStr::new(t.unquoted()));
        let in_super = statement
            .find_word("IN")
            .and_then(|i| statement.word_after(i))
            .is_some_and(|t| t.is_word("SUPER"));
        let item = ProcedureItem {
            external,
            private: statement.has_word("PRIVATE"),
            in_super,
        };
        let id = self.ctx.add_item(name, &name_token, ItemKind::Procedure(item));
        self.open_routine(id, RoutineKind::Procedure, "PROCEDURE", &opener);
        Ok(())
    }

    fn function(&mut self, statement: &Statement, colon: bool) -> Result<(), AnalyzeFault> {
        let opener = statement.first().cloned().ok_or_else(|| missing_name(statement))?;
        let (name_token, name) = name_at(statement, 1)?;
        let name_token = name_token.clone();
        let forward = find_top_level(statement, "FORWARD").is_some();
        let in_handle = find_top_level(statement, "IN")
            .and_then(|i| statement.word_after(i))
            .map(|t| t.text.clone());
        let return_type = find_top_level(statement, "RETURNS")
            .and_then(|i| type_after(statement, i))
            .unwrap_or_default();
        let parameters = statement.first_group();
        let key = lower(&name);
        let entry = self.ctx.functions.get(&key).cloned().unwrap_or_default();

        if !colon || forward || in_handle.is_some() {
            let id = self.ctx.add_item(
                name,
                &name_token,
                ItemKind::Prototype(PrototypeItem {
                    return_type,
                    parameters,
                    forward,
                    in_handle,
                    implementation: entry.implementation,
                }),
            );
            if let Some(implementation) = entry.implementation
                && let ItemKind::Implementation(item) = &mut self.ctx.item_mut(implementation)?.kind
            {
                item.prototype = Some(id);
            }
            self.ctx.functions.insert(
                key,
                FunctionEntry {
                    prototype: Some(id),
                    ..entry
                },
            );
        } else {
            let id = self.ctx.add_item(
                name,
                &name_token,
                ItemKind::Implementation(ImplementationItem {
                    return_type,
                    parameters,
                    private: statement.has_word("PRIVATE"),
                    prototype: entry.prototype,
                }),
            );
            if let Some(prototype) = entry.prototype
                && let ItemKind::Prototype(item) = &mut self.ctx.item_mut(prototype)?.kind
            {
                item.implementation = Some(id);
            }
            self.ctx.functions.insert(
                key,
                FunctionEntry {
                    implementation: Some(id),
                    ..entry
                },
            );
            self.open_routine(id, RoutineKind::Function, "FUNCTION", &opener);
        }
        Ok(())
    }

    fn method(&mut self, statement: &Statement, colon: bool) -> Result<(), AnalyzeFault> {
        let opener = statement.first().cloned().ok_or_else(|| missing_name(statement))?;
        let name_index = statement
            .parts
            .iter()
            .position(|p| p.token.is_symbol("("))
            .map_or(statement.parts.len(), |open| open)
            .checked_sub(1)
            .filter(|i| *i >= 1)
            .ok_or_else(|| missing_name(statement))?;
        let (name_token, name) = name_at(statement, name_index)?;
        let name_token = name_token.clone();

        let method_kind = match statement.kind {
            StatementKind::Constructor => MethodKind::Constructor,
            StatementKind::Destructor => MethodKind::Destructor,
            _ => MethodKind::Method,
        };
        let header = &statement.parts[1..name_index];
        let modifiers: Vec<SmolStr> = header
            .iter()
            .filter(|p| METHOD_MODIFIERS.contains(&p.token.text.to_ascii_uppercase().as_str()))
            .map(|p| SmolStr::new(p.token.text.to_ascii_uppercase()))
            .collect();
        let return_type = match method_kind {
            MethodKind::Method => header
                .iter()
                .rev()
                .map(|p| &p.token)
                .find(|t| {
                    t.kind == TokenKind::Word
                        && !t.is_word("CLASS")
                        && !METHOD_MODIFIERS.contains(&t.text.to_ascii_uppercase().as_str())
                })
                .map(|t| t.text.clone())
                .unwrap_or_default(),
            _ => SmolStr::default(),
        };

        let id = self.ctx.add_item(
            name,
            &name_token,
            ItemKind::Method(MethodItem {
                method_kind,
                return_type,
                modifiers,
                parameters: statement.first_group(),
                declaration_only: !colon,
            }),
        );
        if colon {
            let keyword = opener.text.to_ascii_uppercase();
            self.open_routine(id, RoutineKind::Method, &keyword, &opener);
        }
        Ok(())
    }

    /// `ON ... OF ...` that never reached an action word.
    fn on_statement(&mut self, statement: &Statement) -> Result<(), AnalyzeFault> {
        if statement.has_word("OF") || statement.has_word("ANYWHERE") {
            let saved = std::mem::replace(&mut self.ctx.statement, statement.clone());
            let result = self.on_item();
            self.ctx.statement = saved;
            result?;
        }
        Ok(())
    }

    fn run_statement(&mut self, statement: &Statement) -> Result<(), AnalyzeFault> {
        let first = statement.token(1).ok_or_else(|| missing_name(statement))?.clone();
        let mut dynamic = false;
        let mut target = String::new();
        let mut end = 1;

        if first.is_word("VALUE") && statement.token(2).is_some_and(|t| t.is_symbol("(")) {
            dynamic = true;
            let mut depth = 0usize;
            for (i, part) in statement.parts.iter().enumerate().skip(2) {
                if part.token.is_symbol("(") {
                    depth += 1;
                    if depth == 1 {
                        continue;
                    }
                } else if part.token.is_symbol(")") {
                    depth -= 1;
                    if depth == 0 {
                        end = i + 1;
                        break;
                    }
                }
                if part.spaced && !target.is_empty() {
                    target.push(' ');
                }
                target.push_str(&part.token.text);
                end = i + 1;
            }
        } else {
            for (i, part) in statement.parts.iter().enumerate().skip(1) {
                if (i > 1 && part.spaced) || part.token.is_symbol("(") {
                    break;
                }
                target.push_str(part.token.unquoted());
                end = i + 1;
            }
        }
        if target.is_empty() {
            return Err(missing_name(statement));
        }

        let rest = &statement.parts[end.min(statement.parts.len())..];
        let in_handle = rest
            .iter()
            .position(|p| p.token.is_word("IN"))
            .and_then(|i| rest.get(i + 1))
            .map(|p| p.token.text.clone());
        let item = RunItem {
            target: SmolStr::new(&target),
            dynamic,
            persistent: rest.iter().any(|p| p.token.is_word("PERSISTENT")),
            in_handle,
            has_parameters: rest.iter().any(|p| p.token.is_symbol("(")),
        };
        self.ctx.add_item(target, &first, ItemKind::Run(item));
        Ok(())
    }

    fn define(&mut self, statement: &Statement, colon: bool) -> Result<(), AnalyzeFault> {
        let mut index = 1;
        let mut modifiers: Vec<SmolStr> = Vec::new();
        while let Some(token) = statement.token(index) {
            let upper = token.text.to_ascii_uppercase();
            if token.kind != TokenKind::Word || !(DEFINE_MODIFIERS.contains(&upper.as_str()) || upper == "NO-UNDO") {
                break;
            }
            modifiers.push(SmolStr::new(upper));
            index += 1;
        }
        let Some(define_type) = statement.token(index).and_then(|t| DefineType::parse(&t.text)) else {
            return Ok(());
        };
        index += 1;
        if statement.has_word("NO-UNDO") && !modifiers.iter().any(|m| m == "NO-UNDO") {
            modifiers.push(SmolStr::new_static("NO-UNDO"));
        }

        match define_type {
            DefineType::Buffer => return self.buffer(statement, index),
            DefineType::Parameter => {
                let next = statement.token(index).map(|t| t.text.to_ascii_uppercase()).unwrap_or_default();
                match next.as_str() {
                    "BUFFER" => return self.buffer(statement, index + 1),
                    "TABLE" | "DATASET" | "TABLE-HANDLE" | "DATASET-HANDLE" => {
                        index += 1;
                        if statement.token(index).is_some_and(|t| t.is_word("FOR")) {
                            index += 1;
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }

        let (name_token, name) = name_at(statement, index)?;
        let name_token = name_token.clone();
        let as_type = find_top_level(statement, "AS").and_then(|i| type_after(statement, i));
        let like = find_top_level(statement, "LIKE")
            .and_then(|i| statement.word_after(i))
            .map(|t| t.text.clone());

        match define_type {
            DefineType::Event => {
                self.ctx.add_item(name, &name_token, ItemKind::Event);
            }
            _ => {
                if matches!(define_type, DefineType::TempTable | DefineType::WorkTable) {
                    self.ctx.local_tables.insert(lower(&name), true);
                }
                let primitive = as_type
                    .as_deref()
                    .map(|t| PrimitiveType::parse(t).unwrap_or(PrimitiveType::Class));
                self.ctx.add_item(
                    name,
                    &name_token,
                    ItemKind::Define(DefineItem {
                        define_type,
                        as_type: as_type.unwrap_or_default(),
                        primitive,
                        like,
                        modifiers,
                    }),
                );
            }
        }

        if colon && let Some(accessor) = accessor_opener(statement) {
            let keyword = SmolStr::new(accessor.text.to_ascii_uppercase());
            let opener = accessor.clone();
            self.ctx.push_scope(
                Scope::Block {
                    opener: opener.clone(),
                    keyword,
                    label: None,
                },
                &opener,
            );
        }
        Ok(())
    }

    /// `BUFFER name FOR [TEMP-TABLE] table`, `index` at the buffer name.
    fn buffer(&mut self, statement: &Statement, index: usize) -> Result<(), AnalyzeFault> {
        let (name_token, name) = name_at(statement, index)?;
        let name_token = name_token.clone();
        let mut table_index = statement.find_word("FOR").map(|i| i + 1);
        let mut temp_table = false;
        if let Some(i) = table_index
            && statement.token(i).is_some_and(|t| t.is_word("TEMP-TABLE"))
        {
            temp_table = true;
            table_index = Some(i + 1);
        }
        let for_table = table_index
            .and_then(|i| statement.token(i))
            .map(|t| t.text.clone())
            .unwrap_or_default();
        temp_table |= self.ctx.local_tables.get(&lower(&for_table)).copied().unwrap_or(false);
        self.ctx.local_tables.insert(lower(&name), temp_table);
        self.ctx.add_item(
            name,
            &name_token,
            ItemKind::Buffer(BufferItem { for_table, temp_table }),
        );
        Ok(())
    }

    /// `VAR [modifiers] type name [= value][, name ...]`
    fn var(&mut self, statement: &Statement) -> Result<(), AnalyzeFault> {
        let mut index = 1;
        let mut modifiers: Vec<SmolStr> = Vec::new();
        while let Some(token) = statement.token(index) {
            let upper = token.text.to_ascii_uppercase();
            if !DEFINE_MODIFIERS.contains(&upper.as_str()) {
                break;
            }
            modifiers.push(SmolStr::new(upper));
            index += 1;
        }
        if statement.token(index).is_some_and(|t| t.is_word("CLASS")) {
            index += 1;
        }
        let type_token = statement.token(index).ok_or_else(|| missing_name(statement))?;
        let as_type = type_token.text.clone();
        let primitive = PrimitiveType::parse(&as_type).unwrap_or(PrimitiveType::Class);

        let mut names: Vec<Token> = Vec::new();
        let mut depth = 0usize;
        let mut expect_name = true;
        for part in &statement.parts[index + 1..] {
            let token = &part.token;
            match token.text.as_str() {
                "(" | "[" if token.kind == TokenKind::Symbol => depth += 1,
                ")" | "]" if token.kind == TokenKind::Symbol => depth = depth.saturating_sub(1),
                "," if token.kind == TokenKind::Symbol && depth == 0 => expect_name = true,
                _ if expect_name && depth == 0 && token.kind == TokenKind::Word => {
                    names.push(token.clone());
                    expect_name = false;
                }
                _ => {}
            }
        }
        if names.is_empty() {
            return Err(missing_name(statement));
        }
        for name in names {
            self.ctx.add_item(
                name.text.clone(),
                &name,
                ItemKind::Define(DefineItem {
                    define_type: DefineType::Variable,
                    as_type: as_type.clone(),
                    primitive: Some(primitive),
                    like: None,
                    modifiers: modifiers.clone(),
                }),
            );
        }
        Ok(())
    }

    /// A lone unknown word ended by `:` names the next block.
    fn label(&mut self, statement: &Statement) -> Result<bool, AnalyzeFault> {
        let [part] = statement.parts.as_slice() else {
            return Ok(false);
        };
        let token = &part.token;
        if token.kind != TokenKind::Word || self.directory.is_keyword(&token.text) {
            return Ok(false);
        }
        let id = self
            .ctx
            .add_item(token.text.clone(), token, ItemKind::Label(LabelItem::default()));
        self.ctx.pending_label = Some(id);
        Ok(true)
    }

    fn block(&mut self, statement: &Statement) -> Result<(), AnalyzeFault> {
        let opener = statement.first().cloned().ok_or_else(|| missing_name(statement))?;
        let keyword = SmolStr::new(opener.text.to_ascii_uppercase());

        if let Some(on) = statement.on_item
            && keyword == "DO"
        {
            if let ItemKind::OnStatement(item) = &mut self.ctx.item_mut(on)?.kind {
                item.has_block = true;
            }
            self.ctx.push_scope(
                Scope::Routine {
                    item: on,
                    kind: RoutineKind::Trigger,
                    keyword,
                    opener: opener.clone(),
                },
                &opener,
            );
            return Ok(());
        }

        let label = self.ctx.pending_label.take();
        if let Some(label) = label
            && let ItemKind::Label(item) = &mut self.ctx.item_mut(label)?.kind
        {
            item.block_keyword = Some(keyword.clone());
        }
        self.ctx.push_scope(
            Scope::Block {
                opener: opener.clone(),
                keyword,
                label,
            },
            &opener,
        );
        Ok(())
    }

    fn end(&mut self, statement: &Statement) -> Result<(), AnalyzeFault> {
        let end = statement.first().cloned().ok_or_else(|| missing_name(statement))?;
        let target = self
            .ctx
            .stack
            .position_from_top(|s| !matches!(s, Scope::PreprocIf { .. }))
            .filter(|i| self.ctx.stack.iter().nth(*i).is_some_and(Scope::is_block_like));
        let Some(index) = target else {
            self.ctx.error(ParserErrorKind::UnexpectedBlockEnd, &end);
            return Ok(());
        };

        let qualifier = statement.token(1).filter(|t| t.kind == TokenKind::Word).cloned();
        let depth = self.ctx.stack.len();
        let (scope, _) = self.ctx.stack.remove(index);
        let (keyword, item) = match &scope {
            Scope::Routine { keyword, item, .. } => (keyword.clone(), Some(*item)),
            Scope::Block { keyword, label, .. } => (keyword.clone(), *label),
            _ => (SmolStr::default(), None),
        };
        if let Some(qualifier) = qualifier
            && !abbreviates(&qualifier.text, &keyword, keyword.len().min(3))
        {
            let line = self.ctx.root_line(&end);
            self.ctx.error_at(ParserErrorKind::MismatchedBlockEnd, &end, line, depth);
        }
        if let Some(item) = item {
            let line = self.ctx.root_line(&end);
            self.ctx.set_end_line(item, line)?;
        }
        Ok(())
    }
}
