//! Schema dump model
//!
//! A dump is a tab-separated, line-oriented file. The first character of a
//! line is its record type; every record type has a fixed column count and
//! lines that don't match it are skipped:
//!
//! ```text
//! H  dump date | dump time | logical name | physical name | version        (6)
//! S  sequence name                                                      (3)
//! T  name | id | crc | dump name | description | hidden | frozen | kind   (9)
//! X  table | event | procedure | crc                                     (5)
//! I  table | name | primary | unique | crc | fields joined by %          (7)
//! F  table | name | type | format | order | mandatory | extent |
//!    in index | in primary key | initial | description                  (12)
//! ```
//!
//! `S`, `T` records belong to the last `H`; `X`, `I`, `F` to the last `T`.

use std::fs;
use std::path::{Path, PathBuf};

use smol_str::SmolStr;
use thiserror::Error;
use tracing::debug;

/// Errors reading a schema dump from disk.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema dump {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// ABL data types, shared by schema fields and `DEFINE ... AS` statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveType {
    Character,
    Longchar,
    Integer,
    Int64,
    Decimal,
    Logical,
    Date,
    Datetime,
    DatetimeTz,
    Handle,
    ComHandle,
    Rowid,
    Recid,
    Raw,
    Memptr,
    Blob,
    Clob,
    /// Any other type name (class types)
    Class,
}

impl PrimitiveType {
    /// Parse a type name, accepting the usual abbreviations (`CHAR`, `INT`,
    /// `DEC`, `LOG`...). Returns `None` for names that are not built-in types.
    pub fn parse(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        let abbreviates = |full: &str, min: usize| upper.len() >= min && full.starts_with(upper.as_str());

        let ty = match upper.as_str() {
            "INT64" => Self::Int64,
            "DATE" => Self::Date,
            "DATETIME" => Self::Datetime,
            "DATETIME-TZ" => Self::DatetimeTz,
            "HANDLE" | "WIDGET-HANDLE" => Self::Handle,
            "COM-HANDLE" => Self::ComHandle,
            "ROWID" => Self::Rowid,
            "RECID" => Self::Recid,
            "RAW" => Self::Raw,
            "MEMPTR" => Self::Memptr,
            "LONGCHAR" => Self::Longchar,
            "BLOB" => Self::Blob,
            "CLOB" => Self::Clob,
            _ if abbreviates("CHARACTER", 4) => Self::Character,
            _ if abbreviates("INTEGER", 3) => Self::Integer,
            _ if abbreviates("DECIMAL", 3) => Self::Decimal,
            _ if abbreviates("LOGICAL", 3) => Self::Logical,
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "CHARACTER",
            Self::Longchar => "LONGCHAR",
            Self::Integer => "INTEGER",
            Self::Int64 => "INT64",
            Self::Decimal => "DECIMAL",
            Self::Logical => "LOGICAL",
            Self::Date => "DATE",
            Self::Datetime => "DATETIME",
            Self::DatetimeTz => "DATETIME-TZ",
            Self::Handle => "HANDLE",
            Self::ComHandle => "COM-HANDLE",
            Self::Rowid => "ROWID",
            Self::Recid => "RECID",
            Self::Raw => "RAW",
            Self::Memptr => "MEMPTR",
            Self::Blob => "BLOB",
            Self::Clob => "CLOB",
            Self::Class => "CLASS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableKind {
    #[default]
    Table,
    System,
    View,
}

impl TableKind {
    fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "S" => Self::System,
            "V" => Self::View,
            _ => Self::Table,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: SmolStr,
    /// Type as written in the dump
    pub data_type: SmolStr,
    pub primitive: Option<PrimitiveType>,
    pub format: SmolStr,
    pub order: i32,
    pub mandatory: bool,
    pub extent: u32,
    pub in_index: bool,
    pub primary_key: bool,
    pub initial: SmolStr,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: SmolStr,
    pub primary: bool,
    pub unique: bool,
    pub fields: Vec<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub event: SmolStr,
    pub procedure: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub name: SmolStr,
    pub id: SmolStr,
    pub crc: SmolStr,
    pub dump_name: SmolStr,
    pub description: String,
    pub hidden: bool,
    pub frozen: bool,
    pub kind: TableKind,
    pub fields: Vec<Field>,
    pub indexes: Vec<Index>,
    pub triggers: Vec<Trigger>,
}

impl Table {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Primary key first, then case-insensitive by name.
    fn sort_fields(&mut self) {
        self.fields.sort_by(|a, b| {
            b.primary_key
                .cmp(&a.primary_key)
                .then_with(|| a.name.to_ascii_lowercase().cmp(&b.name.to_ascii_lowercase()))
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Database {
    /// Logical name (or alias name)
    pub name: SmolStr,
    pub physical_name: SmolStr,
    pub version: SmolStr,
    pub dump_date: SmolStr,
    pub dump_time: SmolStr,
    pub tables: Vec<Table>,
    /// Logical name of the database this alias points to
    pub alias_of: Option<SmolStr>,
}

impl Database {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub name: SmolStr,
    pub database: SmolStr,
}

/// Every database and sequence of one dump file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    pub databases: Vec<Database>,
    pub sequences: Vec<Sequence>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a dump file. `aliases` is an `ALIAS,LOGICAL;ALIAS2,LOGICAL2` list.
    pub fn read(path: &Path, aliases: &str) -> Result<Self, SchemaError> {
        let bytes = fs::read(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::parse(&String::from_utf8_lossy(&bytes), aliases);
        debug!(
            path = %path.display(),
            databases = schema.databases.len(),
            "schema dump loaded"
        );
        Ok(schema)
    }

    /// Parse dump text. Malformed records are skipped.
    pub fn parse(text: &str, aliases: &str) -> Self {
        let mut schema = Self::new();

        for line in text.lines() {
            let columns: Vec<&str> = line.split('\t').collect();
            let Some(record) = line.chars().next() else {
                continue;
            };
            if !schema.read_record(record, &columns) {
                debug!(line, "skipping malformed schema record");
            }
        }

        schema.add_aliases(aliases);
        for table in schema.databases.iter_mut().flat_map(|db| db.tables.iter_mut()) {
            table.sort_fields();
        }
        schema
    }

    /// Returns false when the record was rejected.
    fn read_record(&mut self, record: char, columns: &[&str]) -> bool {
        match record {
            'H' => {
                if columns.len() != 6 {
                    return false;
                }
                self.databases.push(Database {
                    name: columns[3].into(),
                    physical_name: columns[4].into(),
                    version: columns[5].into(),
                    dump_date: columns[1].into(),
                    dump_time: columns[2].into(),
                    tables: Vec::new(),
                    alias_of: None,
                });
            }
            'S' => {
                let Some(db) = self.databases.last() else {
                    return false;
                };
                if columns.len() != 3 {
                    return false;
                }
                let database = db.name.clone();
                self.sequences.push(Sequence {
                    name: columns[1].into(),
                    database,
                });
            }
            'T' => {
                let Some(db) = self.databases.last_mut() else {
                    return false;
                };
                if columns.len() != 9 {
                    return false;
                }
                db.tables.push(Table {
                    name: columns[1].into(),
                    id: columns[2].into(),
                    crc: columns[3].into(),
                    dump_name: columns[4].into(),
                    description: columns[5].to_string(),
                    hidden: columns[6] == "1",
                    frozen: columns[7] == "1",
                    kind: TableKind::parse(columns[8]),
                    ..Table::default()
                });
            }
            'X' => {
                let Some(table) = self.current_table() else {
                    return false;
                };
                if columns.len() != 5 {
                    return false;
                }
                table.triggers.push(Trigger {
                    event: columns[2].into(),
                    procedure: columns[3].into(),
                });
            }
            'I' => {
                let Some(table) = self.current_table() else {
                    return false;
                };
                if columns.len() != 7 {
                    return false;
                }
                table.indexes.push(Index {
                    name: columns[2].into(),
                    primary: columns[3] == "1",
                    unique: columns[4] == "1",
                    fields: columns[6].split('%').filter(|f| !f.is_empty()).map(SmolStr::from).collect(),
                });
            }
            'F' => {
                let Some(table) = self.current_table() else {
                    return false;
                };
                if columns.len() != 12 {
                    return false;
                }
                let (Ok(order), Ok(extent)) = (columns[5].trim().parse::<i32>(), columns[7].trim().parse::<u32>()) else {
                    return false;
                };
                table.fields.push(Field {
                    name: columns[2].into(),
                    data_type: columns[3].into(),
                    primitive: PrimitiveType::parse(columns[3]),
                    format: columns[4].into(),
                    order,
                    mandatory: columns[6] == "1",
                    extent,
                    in_index: columns[8] == "1",
                    primary_key: columns[9] == "1",
                    initial: columns[10].into(),
                    description: columns[11].to_string(),
                });
            }
            _ => return false,
        }
        true
    }

    fn current_table(&mut self) -> Option<&mut Table> {
        self.databases.last_mut()?.tables.last_mut()
    }

    /// Duplicate databases under their aliases.
    fn add_aliases(&mut self, aliases: &str) {
        for definition in aliases.trim().trim_matches(';').split(';') {
            let Some((alias, logical)) = definition.split_once(',') else {
                continue;
            };
            let (alias, logical) = (alias.trim(), logical.trim());
            if alias.is_empty() || logical.is_empty() || logical.contains(',') {
                continue;
            }
            if let Some(target) = self.find_database(logical) {
                let mut copy = target.clone();
                copy.alias_of = Some(copy.name.clone());
                copy.name = alias.into();
                self.databases.push(copy);
            }
        }
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    pub fn find_database(&self, name: &str) -> Option<&Database> {
        self.databases.iter().find(|db| db.name.eq_ignore_ascii_case(name))
    }

    /// Find `TABLE` in any database, or `DB.TABLE`.
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        match name.split_once('.') {
            Some((db, table)) => self.find_database(db)?.table(table),
            None => self.databases.iter().find_map(|db| db.table(name)),
        }
    }

    /// Find `TABLE.FIELD` or `DB.TABLE.FIELD`.
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        let parts: Vec<&str> = name.split('.').collect();
        let table = match parts.as_slice() {
            [table, _] => self.find_table(table)?,
            [db, table, _] => self.find_database(db)?.table(table)?,
            _ => return None,
        };
        table.field(parts[parts.len() - 1])
    }

    /// Fields of a table, primary key fields first.
    pub fn fields_of(&self, table: &str) -> Option<&[Field]> {
        self.find_table(table).map(|t| t.fields.as_slice())
    }
}
