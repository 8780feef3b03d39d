//! Schema/keyword directory
//!
//! Maps identifiers to what they are (table, field, keyword...). Parses
//! classify words through a [`DirectoryIndex`] snapshot; a rebuild builds a
//! new index off-lock and swaps it in, so a reader sees the old or the new
//! directory in full and a parse keeps one snapshot for its whole run.
//!
//! ```text
//!   rebuild(schema, keywords)          parse
//!        |                               |
//!   DirectoryIndex::build  (no lock)     snapshot() --> Arc<DirectoryIndex>
//!        |                               |
//!   write lock: swap Arc                 classify(word) ...
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::debug;

use super::schema::Schema;

/// Classification of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolKind {
    Keyword,
    Table,
    TableField,
    PrimaryKeyField,
    Database,
    Sequence,
    Unknown,
}

impl SymbolKind {
    pub fn is_table(self) -> bool {
        self == Self::Table
    }

    pub fn is_field(self) -> bool {
        matches!(self, Self::TableField | Self::PrimaryKeyField)
    }
}

/// Immutable lookup table built from a schema and a keyword list.
#[derive(Debug, Default)]
pub struct DirectoryIndex {
    entries: FxHashMap<SmolStr, SymbolKind>,
    schema: Arc<Schema>,
}

impl DirectoryIndex {
    /// Entries are added in order and never overwritten: tables (`table`,
    /// `db.table`), fields (`table.field`, `db.table.field`), databases,
    /// sequences, then keywords.
    pub fn build<I, S>(schema: Arc<Schema>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: FxHashMap<SmolStr, SymbolKind> = FxHashMap::default();
        let mut add = |name: String, kind: SymbolKind| {
            entries.entry(SmolStr::from(name.to_ascii_lowercase())).or_insert(kind);
        };

        for db in &schema.databases {
            for table in &db.tables {
                add(table.name.to_string(), SymbolKind::Table);
                add(format!("{}.{}", db.name, table.name), SymbolKind::Table);
            }
        }
        for db in &schema.databases {
            for table in &db.tables {
                for field in &table.fields {
                    let kind = if field.primary_key {
                        SymbolKind::PrimaryKeyField
                    } else {
                        SymbolKind::TableField
                    };
                    add(format!("{}.{}", table.name, field.name), kind);
                    add(format!("{}.{}.{}", db.name, table.name, field.name), kind);
                }
            }
        }
        for db in &schema.databases {
            add(db.name.to_string(), SymbolKind::Database);
        }
        for sequence in &schema.sequences {
            add(sequence.name.to_string(), SymbolKind::Sequence);
        }
        for keyword in keywords {
            add(keyword.as_ref().to_string(), SymbolKind::Keyword);
        }

        Self { entries, schema }
    }

    /// Case-insensitive lookup.
    pub fn classify(&self, name: &str) -> Option<SymbolKind> {
        if let Some(kind) = self.entries.get(name) {
            return Some(*kind);
        }
        self.entries.get(name.to_ascii_lowercase().as_str()).copied()
    }

    /// Like [`classify`](Self::classify), with `Unknown` for absent names.
    pub fn kind_of(&self, name: &str) -> SymbolKind {
        self.classify(name).unwrap_or(SymbolKind::Unknown)
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        self.classify(name) == Some(SymbolKind::Keyword)
    }

    /// Keywords that did not collide with a schema name, lowercase, unordered.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, kind)| **kind == SymbolKind::Keyword)
            .map(|(name, _)| name.as_str())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared, rebuildable directory.
#[derive(Debug, Default)]
pub struct SchemaDirectory {
    index: RwLock<Arc<DirectoryIndex>>,
}

impl SchemaDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory knowing only the built-in ABL keywords.
    pub fn with_default_keywords() -> Self {
        let directory = Self::new();
        directory.rebuild(Schema::new(), crate::parser::keywords::DEFAULT_KEYWORDS);
        directory
    }

    /// Replace the directory content. The index is built before the write
    /// lock is taken.
    pub fn rebuild<I, S>(&self, schema: Schema, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let index = Arc::new(DirectoryIndex::build(Arc::new(schema), keywords));
        debug!(entries = index.len(), "schema directory rebuilt");
        *self.index.write() = index;
    }

    /// The current index; keep it for a whole parse.
    pub fn snapshot(&self) -> Arc<DirectoryIndex> {
        Arc::clone(&self.index.read())
    }

    pub fn classify(&self, name: &str) -> Option<SymbolKind> {
        self.index.read().classify(name)
    }

    pub fn kind_of(&self, name: &str) -> SymbolKind {
        self.index.read().kind_of(name)
    }
}
