//! Outline, completion and links over fixture sources.

use std::fs;
use std::sync::Arc;

use abl::ide::{completions, document_links, outline, parsed_completion_items, CompletionKind, OutlineKind};
use abl::parser::parse_file;
use abl::parser::ParseEnvironment;
use abl::project::{DirectoryIndex, PropathResolver, Schema};
use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::resolvers::parse_source;
use crate::helpers::source_fixtures::{APPBUILDER_FILE, CLASS_FILE, PROCEDURE_FILE, SCHEMA_DUMP};

fn index() -> DirectoryIndex {
    DirectoryIndex::build(Arc::new(Schema::parse(SCHEMA_DUMP, "")), ["DISPLAY"])
}

fn labels(line_text: &str, line: u32) -> Vec<String> {
    let result = parse_source(PROCEDURE_FILE);
    let parsed = parsed_completion_items(&result);
    let col = line_text.chars().count() as u32;
    completions(&result, &parsed, &index(), line_text, line, col)
        .iter()
        .map(|item| item.label.to_string())
        .collect()
}

#[test]
fn test_procedure_file_outline() {
    let result = parse_source(PROCEDURE_FILE);
    let items = outline(&result);
    let top: Vec<(&str, OutlineKind)> = items.iter().map(|i| (i.name.as_str(), i.kind)).collect();
    assert_eq!(
        top,
        vec![
            ("ttOrder", OutlineKind::TempTable),
            ("loadOrders", OutlineKind::Procedure),
            ("logCount", OutlineKind::Procedure),
            ("orderTotal", OutlineKind::Function),
        ]
    );
    let load = &items[1];
    assert_eq!((load.line, load.end_line), (8, Some(14)));
    assert_eq!(load.children.iter().map(|c| c.kind).collect::<Vec<_>>(), vec![OutlineKind::Run]);
}

#[test]
fn test_class_outline_nests_members() {
    let result = parse_source(CLASS_FILE);
    let items = outline(&result);
    let names: Vec<&str> = items.iter().flat_map(|i| i.walk()).map(|i| i.name.as_str()).collect();
    assert!(names.contains(&"Order"));
    assert!(names.contains(&"Total"));
    assert!(items.iter().flat_map(|i| i.walk()).any(|i| i.kind == OutlineKind::Method));
}

#[test]
fn test_appbuilder_sections_hold_triggers() {
    let result = parse_source(APPBUILDER_FILE);
    let items = outline(&result);
    let sections = items.iter().filter(|i| i.kind == OutlineKind::Section).count();
    assert!(sections >= 2);
    assert!(items.iter().flat_map(|i| i.walk()).any(|i| i.kind == OutlineKind::Trigger));
}

#[rstest]
#[case("    p", 11, vec!["pcCustomer"])]
#[case("  p", 18, vec!["piCount"])]
#[case("c", 11, vec!["cnt", "customer"])]
#[case("RUN lo", 5, vec!["loadOrders", "logCount"])]
#[case("x = order", 22, vec!["orderTotal", "order"])]
fn test_general_completions_respect_scope(#[case] line_text: &str, #[case] line: u32, #[case] expected: Vec<&str>) {
    assert_eq!(labels(line_text, line), expected);
}

#[rstest]
#[case("DISPLAY customer.", vec!["id", "name"])]
#[case("DISPLAY sports.customer.n", vec!["name"])]
#[case("FOR EACH sports.", vec!["customer", "order"])]
#[case("DISPLAY ttOrder.", vec![])]
fn test_member_completions(#[case] line_text: &str, #[case] expected: Vec<&str>) {
    assert_eq!(labels(line_text, 11), expected);
}

#[test]
fn test_completion_kinds_from_parse() {
    let result = parse_source(PROCEDURE_FILE);
    let parsed = parsed_completion_items(&result);
    let kind_of = |label: &str| parsed.iter().find(|i| i.label.as_ref() == label).map(|i| i.kind);
    assert_eq!(kind_of("cnt"), Some(CompletionKind::Variable));
    assert_eq!(kind_of("ttOrder"), Some(CompletionKind::TempTable));
    assert_eq!(kind_of("pcCustomer"), Some(CompletionKind::Parameter));
    assert_eq!(kind_of("loadOrders"), Some(CompletionKind::Procedure));
    assert_eq!(kind_of("orderTotal"), Some(CompletionKind::Function));
}

#[test]
fn test_links_point_at_resolved_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("defs.i"), "DEFINE VARIABLE x AS INTEGER.\n").unwrap();
    fs::write(dir.path().join("report.p"), "DISPLAY 1.\n").unwrap();
    let main = dir.path().join("main.p");
    fs::write(&main, "  {defs.i}\nRUN report.p PERSISTENT.\nRUN report.p IN hLib.\nRUN VALUE(\"report.p\").\n").unwrap();

    let resolver = Arc::new(PropathResolver::new([dir.path()]));
    let env = ParseEnvironment::new(resolver.clone());
    let result = parse_file(&main, &env).unwrap();
    let links = document_links(&result, resolver.as_ref());

    let summary: Vec<(u32, u32, String)> = links
        .iter()
        .map(|l| (l.start_line, l.start_col, l.target.file_name().unwrap().to_string_lossy().into_owned()))
        .collect();
    assert_eq!(summary, vec![(0, 2, "defs.i".to_string()), (1, 4, "report.p".to_string())]);
    assert_eq!(links[0].end_col, 10);
}
