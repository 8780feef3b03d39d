//! Completion suggestions.
//!
//! Two sources feed the list: items of the last parse (procedures,
//! functions, variables, temp-tables, preprocessor names...) collected by a
//! [`ParserVisitor`], and the schema/keyword directory (databases, tables,
//! fields, sequences, keywords).

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::core::text_utils::word_prefix_before_cursor;
use crate::parser::keywords::DefineType;
use crate::parser::{
    BufferItem, DefineItem, ImplementationItem, ItemId, LabelItem, MethodItem, ParseResult, ParsedItem,
    ParserVisitor, PreprocVariableItem, ProcedureItem, PrototypeItem,
};
use crate::project::{DirectoryIndex, Schema, Table};

/// Kind of completion item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    Keyword,
    Database,
    Table,
    TempTable,
    Field,
    PrimaryKeyField,
    Sequence,
    Procedure,
    Function,
    Method,
    Variable,
    Parameter,
    Buffer,
    Widget,
    PreprocVariable,
    Label,
}

impl CompletionKind {
    /// Convert to LSP completion item kind number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            CompletionKind::Keyword => 14,
            CompletionKind::Database => 9,
            CompletionKind::Table | CompletionKind::TempTable | CompletionKind::Buffer => 22, // Struct
            CompletionKind::Field | CompletionKind::PrimaryKeyField => 5,
            CompletionKind::Sequence => 21, // Constant
            CompletionKind::Procedure | CompletionKind::Function => 3,
            CompletionKind::Method => 2,
            CompletionKind::Variable | CompletionKind::Parameter => 6,
            CompletionKind::Widget => 7,
            CompletionKind::PreprocVariable => 21,
            CompletionKind::Label => 18, // Reference
        }
    }
}

/// A completion suggestion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionItem {
    /// The text to insert.
    pub label: Arc<str>,
    /// The kind of completion.
    pub kind: CompletionKind,
    /// Detail text (shown after label).
    pub detail: Option<Arc<str>>,
    /// Documentation (shown in popup).
    pub documentation: Option<Arc<str>>,
    /// Text to insert (if different from label).
    pub insert_text: Option<Arc<str>>,
    /// Sort priority (lower = higher priority).
    pub sort_priority: u32,
    /// Scope item the suggestion was declared in; `None` for schema and
    /// keyword items, which are visible everywhere.
    pub scope: Option<ItemId>,
    /// Root-file line of the declaration.
    pub line: Option<u32>,
}

impl CompletionItem {
    /// Create a new completion item.
    pub fn new(label: impl Into<Arc<str>>, kind: CompletionKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            documentation: None,
            insert_text: None,
            sort_priority: 100,
            scope: None,
            line: None,
        }
    }

    /// Set the detail text.
    pub fn with_detail(mut self, detail: impl Into<Arc<str>>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the documentation.
    pub fn with_documentation(mut self, doc: impl Into<Arc<str>>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    /// Set the insert text.
    pub fn with_insert_text(mut self, text: impl Into<Arc<str>>) -> Self {
        self.insert_text = Some(text.into());
        self
    }

    /// Set the sort priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.sort_priority = priority;
        self
    }

    /// Tie the suggestion to the item that declares it.
    fn declared_by(mut self, item: &ParsedItem) -> Self {
        self.scope = item.scope;
        self.line = Some(item.root_line);
        self
    }

    fn matches_prefix(&self, prefix: &str) -> bool {
        self.label.len() >= prefix.len()
            && self.label.is_char_boundary(prefix.len())
            && self.label[..prefix.len()].eq_ignore_ascii_case(prefix)
    }
}

// ============================================================================
// PARSED ITEMS
// ============================================================================

/// Collects completion items from a parse.
#[derive(Debug, Default)]
pub struct CompletionCollector {
    items: Vec<CompletionItem>,
}

impl CompletionCollector {
    pub fn into_items(self) -> Vec<CompletionItem> {
        self.items
    }

    fn push(&mut self, item: &ParsedItem, completion: CompletionItem) {
        self.items.push(completion.declared_by(item));
    }
}

fn signature(return_type: &str, parameters: &str) -> String {
    if parameters.is_empty() {
        return_type.to_string()
    } else {
        format!("{return_type} ({parameters})")
    }
}

impl ParserVisitor for CompletionCollector {
    fn visit_procedure(&mut self, item: &ParsedItem, procedure: &ProcedureItem) {
        let mut completion = CompletionItem::new(item.name.as_str(), CompletionKind::Procedure).with_priority(30);
        if let Some(library) = &procedure.external {
            completion = completion.with_detail(format!("EXTERNAL {library}"));
        }
        self.push(item, completion);
    }

    fn visit_prototype(&mut self, item: &ParsedItem, prototype: &PrototypeItem) {
        // The implementation, when present, is suggested instead.
        if prototype.implementation.is_some() {
            return;
        }
        let completion = CompletionItem::new(item.name.as_str(), CompletionKind::Function)
            .with_detail(signature(&prototype.return_type, &prototype.parameters))
            .with_priority(30);
        self.push(item, completion);
    }

    fn visit_implementation(&mut self, item: &ParsedItem, implementation: &ImplementationItem) {
        let completion = CompletionItem::new(item.name.as_str(), CompletionKind::Function)
            .with_detail(signature(&implementation.return_type, &implementation.parameters))
            .with_priority(30);
        self.push(item, completion);
    }

    fn visit_method(&mut self, item: &ParsedItem, method: &MethodItem) {
        let completion = CompletionItem::new(item.name.as_str(), CompletionKind::Method)
            .with_detail(signature(&method.return_type, &method.parameters))
            .with_priority(30);
        self.push(item, completion);
    }

    fn visit_label(&mut self, item: &ParsedItem, label: &LabelItem) {
        let mut completion = CompletionItem::new(item.name.as_str(), CompletionKind::Label).with_priority(40);
        if let Some(keyword) = &label.block_keyword {
            completion = completion.with_detail(keyword.as_str());
        }
        self.push(item, completion);
    }

    fn visit_buffer(&mut self, item: &ParsedItem, buffer: &BufferItem) {
        let completion = CompletionItem::new(item.name.as_str(), CompletionKind::Buffer)
            .with_detail(format!("BUFFER FOR {}", buffer.for_table))
            .with_priority(20);
        self.push(item, completion);
    }

    fn visit_define(&mut self, item: &ParsedItem, define: &DefineItem) {
        let kind = match define.define_type {
            DefineType::Variable | DefineType::Property | DefineType::Stream | DefineType::Event => {
                CompletionKind::Variable
            }
            DefineType::Parameter => CompletionKind::Parameter,
            DefineType::Buffer => CompletionKind::Buffer,
            DefineType::TempTable | DefineType::WorkTable => CompletionKind::TempTable,
            _ => CompletionKind::Widget,
        };
        let detail = match (&define.like, define.as_type.is_empty()) {
            (Some(like), _) => format!("LIKE {like}"),
            (None, false) => define.as_type.to_string(),
            (None, true) => define.define_type.as_str().to_string(),
        };
        let completion = CompletionItem::new(item.name.as_str(), kind)
            .with_detail(detail)
            .with_priority(20);
        self.push(item, completion);
    }

    fn visit_preproc_variable(&mut self, item: &ParsedItem, variable: &PreprocVariableItem) {
        if variable.undefine {
            return;
        }
        let completion = CompletionItem::new(format!("&{}", item.name), CompletionKind::PreprocVariable)
            .with_detail(if variable.global { "&GLOBAL-DEFINE" } else { "&SCOPED-DEFINE" })
            .with_documentation(variable.value.as_str())
            .with_priority(25);
        self.push(item, completion);
    }
}

/// Completion items declared by a parse, in emission order.
pub fn parsed_completion_items(result: &ParseResult) -> Vec<CompletionItem> {
    let mut collector = CompletionCollector::default();
    result.accept(&mut collector);
    collector.into_items()
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Databases, tables (bare and qualified), sequences and keywords.
pub fn schema_completion_items(index: &DirectoryIndex) -> Vec<CompletionItem> {
    let schema = index.schema();
    let mut items = Vec::new();
    for db in &schema.databases {
        let mut item = CompletionItem::new(db.name.as_str(), CompletionKind::Database).with_priority(60);
        if let Some(logical) = &db.alias_of {
            item = item.with_detail(format!("alias of {logical}"));
        }
        items.push(item);
        for table in &db.tables {
            items.push(table_item(db.name.as_str(), table));
        }
    }
    for sequence in &schema.sequences {
        items.push(
            CompletionItem::new(sequence.name.as_str(), CompletionKind::Sequence)
                .with_detail(format!("sequence of {}", sequence.database))
                .with_priority(60),
        );
    }
    let mut keywords: Vec<&str> = index.keywords().collect();
    keywords.sort_unstable();
    items.extend(
        keywords
            .into_iter()
            .map(|keyword| CompletionItem::new(keyword.to_ascii_uppercase(), CompletionKind::Keyword).with_priority(90)),
    );
    items
}

fn table_item(database: &str, table: &Table) -> CompletionItem {
    let item = CompletionItem::new(table.name.as_str(), CompletionKind::Table)
        .with_detail(database)
        .with_priority(50);
    if table.description.is_empty() {
        item
    } else {
        item.with_documentation(table.description.as_str())
    }
}

/// Fields of `table` (`table` or `db.table`), primary key first.
pub fn field_completion_items(schema: &Schema, table: &str) -> Vec<CompletionItem> {
    let Some(table) = schema.find_table(table) else {
        return Vec::new();
    };
    table
        .fields
        .iter()
        .map(|field| {
            let kind = if field.primary_key {
                CompletionKind::PrimaryKeyField
            } else {
                CompletionKind::Field
            };
            let mut detail = field.data_type.to_string();
            if field.extent > 0 {
                detail.push_str(&format!(" EXTENT {}", field.extent));
            }
            let item = CompletionItem::new(field.name.as_str(), kind)
                .with_detail(detail)
                .with_priority(if field.primary_key { 10 } else { 15 });
            if field.description.is_empty() {
                item
            } else {
                item.with_documentation(field.description.as_str())
            }
        })
        .collect()
}

// ============================================================================
// QUERY
// ============================================================================

/// Completion context.
#[derive(Debug, PartialEq, Eq)]
enum CompletionContext {
    /// After `qualifier.`: members of a database or table
    Member { qualifier: String, partial: String },
    General { partial: String },
}

fn determine_context(line_text: &str, col: u32) -> CompletionContext {
    let prefix = word_prefix_before_cursor(line_text, col as usize);
    match prefix.rsplit_once('.') {
        Some((qualifier, partial)) if !qualifier.is_empty() => CompletionContext::Member {
            qualifier: qualifier.to_string(),
            partial: partial.to_string(),
        },
        _ => CompletionContext::General { partial: prefix },
    }
}

/// True when a parsed declaration can be used at root-file `line`: declared
/// at file level, in a scope open on that line, or a routine.
fn visible_at(result: &ParseResult, item: &CompletionItem, line: u32) -> bool {
    if matches!(
        item.kind,
        CompletionKind::Procedure | CompletionKind::Function | CompletionKind::Method
    ) {
        return true;
    }
    if item.kind == CompletionKind::PreprocVariable && item.line.is_some_and(|l| l > line) {
        return false;
    }
    let Some(scope) = item.scope else {
        return true;
    };
    if result.root().is_some_and(|root| root.id == scope) {
        return true;
    }
    result
        .line(line)
        .is_some_and(|info| info.scope.iter().any(|frame| frame.item == Some(scope)))
}

/// Suggestions at column `col` of `line_text`, root-file line `line`.
///
/// `parsed` is the output of [`parsed_completion_items`] for `result`.
pub fn completions(
    result: &ParseResult,
    parsed: &[CompletionItem],
    index: &DirectoryIndex,
    line_text: &str,
    line: u32,
    col: u32,
) -> Vec<CompletionItem> {
    let mut items: Vec<CompletionItem> = match determine_context(line_text, col) {
        CompletionContext::Member { qualifier, partial } => {
            let schema = index.schema();
            let mut members = match schema.find_database(&qualifier) {
                Some(db) => db.tables.iter().map(|table| table_item(db.name.as_str(), table)).collect(),
                None => field_completion_items(schema, &temp_table_target(parsed, &qualifier).unwrap_or(qualifier)),
            };
            members.retain(|item| item.matches_prefix(&partial));
            members
        }
        CompletionContext::General { partial } => parsed
            .iter()
            .filter(|item| visible_at(result, item, line))
            .cloned()
            .chain(schema_completion_items(index))
            .filter(|item| item.matches_prefix(&partial))
            .collect(),
    };

    items.sort_by_key(|item| item.sort_priority);
    let mut seen = FxHashSet::default();
    items.retain(|item| seen.insert(item.label.to_ascii_lowercase()));
    items
}

/// Table behind a buffer name declared in the parse, so `b.` lists the
/// fields of the buffered table.
fn temp_table_target(parsed: &[CompletionItem], name: &str) -> Option<String> {
    parsed
        .iter()
        .find(|item| item.kind == CompletionKind::Buffer && item.label.eq_ignore_ascii_case(name))
        .and_then(|item| item.detail.as_deref())
        .and_then(|detail| detail.strip_prefix("BUFFER FOR "))
        .map(str::to_string)
}
