//! Schema dumps and the schema directory.

use std::fs;
use std::sync::Arc;

use abl::parser::{parse, ItemKind, ParseEnvironment};
use abl::project::{DirectoryIndex, Schema, SchemaDirectory, SchemaError, SymbolKind, TableKind};
use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::source_fixtures::SCHEMA_DUMP;

fn sports() -> Schema {
    Schema::parse(SCHEMA_DUMP, "")
}

#[test]
fn test_read_dump_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sports.dump");
    fs::write(&path, SCHEMA_DUMP).unwrap();

    let schema = Schema::read(&path, "").unwrap();
    assert_eq!(schema, sports());
    assert_eq!(schema.databases.len(), 1);

    let db = &schema.databases[0];
    assert_eq!((db.name.as_str(), db.physical_name.as_str(), db.version.as_str()), ("sports", "/db/sports", "12.2"));
    assert_eq!(db.tables.len(), 2);
    assert_eq!(db.tables[0].kind, TableKind::Table);
    assert_eq!(schema.sequences[0].name, "next-cust");
    assert_eq!(schema.sequences[0].database, "sports");
}

#[test]
fn test_missing_dump_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Schema::read(&dir.path().join("none.dump"), "").unwrap_err();
    assert!(matches!(err, SchemaError::Io { .. }));
}

#[test]
fn test_primary_key_fields_sort_first() {
    let schema = sports();
    let names: Vec<&str> = schema.fields_of("customer").unwrap().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name"]);

    let id = schema.find_field("sports.customer.id").unwrap();
    assert!(id.primary_key);
    assert_eq!(id.description, "Id");
    assert!(schema.find_field("customer.nope").is_none());
}

#[test]
fn test_aliases_copy_databases() {
    let schema = Schema::parse(SCHEMA_DUMP, "shop,sports;bad;other,missing");
    assert_eq!(schema.databases.len(), 2);
    let alias = schema.find_database("SHOP").unwrap();
    assert_eq!(alias.alias_of.as_deref(), Some("sports"));
    assert!(schema.find_table("shop.order").is_some());
}

#[rstest]
#[case("customer", SymbolKind::Table)]
#[case("SPORTS.Customer", SymbolKind::Table)]
#[case("customer.id", SymbolKind::PrimaryKeyField)]
#[case("sports.customer.name", SymbolKind::TableField)]
#[case("sports", SymbolKind::Database)]
#[case("next-cust", SymbolKind::Sequence)]
#[case("display", SymbolKind::Keyword)]
#[case("orderLine", SymbolKind::Unknown)]
fn test_directory_classify(#[case] name: &str, #[case] expected: SymbolKind) {
    let index = DirectoryIndex::build(Arc::new(sports()), ["DISPLAY", "FOR", "EACH"]);
    assert_eq!(index.kind_of(name), expected);
}

#[test]
fn test_schema_names_win_over_keywords() {
    let index = DirectoryIndex::build(Arc::new(sports()), ["ORDER", "DISPLAY"]);
    assert_eq!(index.kind_of("order"), SymbolKind::Table);
    let keywords: Vec<&str> = index.keywords().collect();
    assert_eq!(keywords, vec!["display"]);
}

#[test]
fn test_snapshot_survives_rebuild() {
    let directory = SchemaDirectory::new();
    directory.rebuild(sports(), ["DISPLAY"]);
    let before = directory.snapshot();

    directory.rebuild(Schema::new(), ["DISPLAY"]);
    assert_eq!(before.kind_of("customer"), SymbolKind::Table);
    assert_eq!(directory.kind_of("customer"), SymbolKind::Unknown);
    assert_eq!(directory.kind_of("display"), SymbolKind::Keyword);
}

#[test]
fn test_parse_reports_schema_tables_once_per_scope() {
    let directory = SchemaDirectory::with_default_keywords();
    let keywords: Vec<String> = directory.snapshot().keywords().map(str::to_string).collect();
    directory.rebuild(sports(), keywords);
    let env = ParseEnvironment::default().with_directory(Arc::new(directory));

    let result = parse(
        "FOR EACH customer:\n  DISPLAY customer.name.\nEND.\nPROCEDURE p:\n  FIND FIRST customer.\nEND PROCEDURE.\n",
        None,
        &env,
    );
    let uses: Vec<(&str, u32)> = result
        .items_of("table-use")
        .map(|i| (i.name.as_str(), i.root_line))
        .collect();
    assert_eq!(uses, vec![("customer", 0), ("customer", 4)]);
    assert!(result
        .items_of("table-use")
        .all(|i| matches!(&i.kind, ItemKind::TableUse(t) if !t.temp_table)));
}

#[test]
fn test_database_qualified_names_share_the_table_use() {
    let directory = SchemaDirectory::with_default_keywords();
    let keywords: Vec<String> = directory.snapshot().keywords().map(str::to_string).collect();
    directory.rebuild(sports(), keywords);
    let env = ParseEnvironment::default().with_directory(Arc::new(directory));

    let result = parse(
        "DISPLAY sports.customer.name.
FIND FIRST customer.
DISPLAY sports.customer.id.
PROCEDURE p:
  FIND FIRST sports.customer.
END PROCEDURE.
",
        None,
        &env,
    );
    let uses: Vec<(&str, u32)> = result
        .items_of("table-use")
        .map(|i| (i.name.as_str(), i.root_line))
        .collect();
    assert_eq!(uses, vec![("customer", 0), ("customer", 4)]);
}
