//! Block structure, line info and structural errors.

use abl::parser::{ItemKind, ParserErrorKind, ScopeKind};
use proptest::prelude::*;
use rstest::rstest;

use crate::helpers::resolvers::parse_source;
use crate::helpers::source_fixtures::{APPBUILDER_FILE, CLASS_FILE, PROCEDURE_FILE};

fn last_line(text: &str) -> usize {
    text.matches('\n').count()
}

// =============================================================================
// LINE INFO
// =============================================================================

#[rstest]
#[case("")]
#[case("DISPLAY 1.")]
#[case("/* one\n   long\n   comment */")]
#[case("/* unterminated\n\n")]
#[case("PROCEDURE p:\n\n\n")]
#[case("\n\n\n\n")]
fn test_line_info_is_total(#[case] text: &str) {
    let result = parse_source(text);
    assert_eq!(result.line_info.len(), last_line(text) + 1);
}

#[test]
fn test_line_info_tracks_open_scopes() {
    let result = parse_source(PROCEDURE_FILE);
    let line_of = |needle: &str| PROCEDURE_FILE.lines().position(|l| l.contains(needle)).unwrap() as u32;

    let inside_for = result.line(line_of("cnt = cnt + 1")).unwrap();
    let kinds: Vec<ScopeKind> = inside_for.scope.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![ScopeKind::File, ScopeKind::Procedure, ScopeKind::Block]);
    assert_eq!(inside_for.depth(), 2);
    assert_eq!(inside_for.outline_depth(), 1);

    let section = result.scope_of_line(line_of("MESSAGE piCount")).unwrap();
    assert_eq!(section.name, "logCount");

    let top = result.scope_of_line(line_of("DEFINE VARIABLE cnt")).unwrap();
    assert!(matches!(top.kind, ItemKind::File(_)));
}

// =============================================================================
// BALANCED INPUT
// =============================================================================

#[rstest]
#[case::procedures(PROCEDURE_FILE)]
#[case::class(CLASS_FILE)]
#[case::appbuilder(APPBUILDER_FILE)]
fn test_fixtures_are_balanced(#[case] text: &str) {
    let result = parse_source(text);
    assert!(result.is_ok(), "{:?}", result.errors);
    assert_eq!(result.final_stack_depth, 1);
    assert_eq!(result.line_info.len(), last_line(text) + 1);
}

/// A balanced program: statements and nested blocks, each on its own lines.
fn balanced_program() -> impl Strategy<Value = String> {
    let statement = prop_oneof![
        Just("DISPLAY 1.\n".to_string()),
        Just("x = x + 1.\n".to_string()),
        Just("/* note\n   more */\n".to_string()),
        Just("MESSAGE \"a. b:\" VIEW-AS ALERT-BOX.\n".to_string()),
        Just("\n".to_string()),
    ];
    let body = statement.prop_recursive(4, 32, 6, |inner| {
        let lines = prop::collection::vec(inner, 0..6).prop_map(|v| v.concat());
        prop_oneof![
            lines.clone().prop_map(|b| format!("DO:\n{b}END.\n")),
            lines.clone().prop_map(|b| format!("FOR EACH customer NO-LOCK:\n{b}END.\n")),
            lines.clone().prop_map(|b| format!("REPEAT:\n{b}END.\n")),
            lines.prop_map(|b| b),
        ]
    })
    .boxed();
    let routine = (0u32..100, prop::collection::vec(body.clone(), 0..4)).prop_map(|(n, parts)| {
        format!("PROCEDURE p{n}:\n{}END PROCEDURE.\n", parts.concat())
    });
    prop::collection::vec(prop_oneof![body, routine], 0..8).prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_balanced_input_has_no_errors(text in balanced_program()) {
        let result = parse_source(&text);
        prop_assert!(result.is_ok(), "{:?}\n{}", result.errors, text);
        prop_assert_eq!(result.final_stack_depth, 1);
        prop_assert_eq!(result.line_info.len(), last_line(&text) + 1);
    }

    #[test]
    fn test_unclosed_procedure_reported_on_its_line(
        before in prop::collection::vec(Just("DISPLAY 1.\n"), 0..5),
        after in prop::collection::vec(Just("  x = 1.\n"), 0..5),
    ) {
        let text = format!("{}PROCEDURE open:\n{}", before.concat(), after.concat());
        let result = parse_source(&text);
        prop_assert_eq!(result.errors.len(), 1);
        prop_assert_eq!(result.errors[0].kind, ParserErrorKind::MissingBlockEnd);
        prop_assert_eq!(result.errors[0].root_line as usize, before.len());
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[rstest]
#[case("END.\n", ParserErrorKind::UnexpectedBlockEnd, 0)]
#[case("DO:\nEND PROCEDURE.\n", ParserErrorKind::MismatchedBlockEnd, 1)]
#[case("DISPLAY 1.\nREPEAT:\n", ParserErrorKind::MissingBlockEnd, 1)]
#[case("PROCEDURE a:\nFUNCTION f RETURNS LOGICAL:\nEND.\nEND.\n", ParserErrorKind::NestedRoutine, 1)]
#[case("&ELSE\n", ParserErrorKind::UnexpectedPreprocDirective, 0)]
#[case("\n&IF TRUE &THEN\n", ParserErrorKind::MissingPreprocEndIf, 1)]
#[case("&ANALYZE-RESUME\n", ParserErrorKind::UnexpectedSuspendEnd, 0)]
#[case("&ANALYZE-SUSPEND _CODE\n", ParserErrorKind::MissingSuspendEnd, 0)]
fn test_structural_errors(#[case] text: &str, #[case] kind: ParserErrorKind, #[case] line: u32) {
    let result = parse_source(text);
    assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
    assert_eq!(result.errors[0].kind, kind);
    assert_eq!(result.errors[0].root_line, line);
}

#[rstest]
#[case::bare_get("GET:\n    RETURN \"x\".\n  END GET.\n")]
#[case::empty_parameters("GET():\n    RETURN \"x\".\n  END GET.\n")]
#[case::set_with_parameter("GET.\n  SET(INPUT v AS CHARACTER):\n    x = v.\n  END SET.\n")]
#[case::get_and_set(
    "GET():\n    RETURN \"x\".\n  END GET.\n  SET(INPUT v AS CHARACTER):\n    x = v.\n  END SET.\n"
)]
fn test_property_accessors_are_balanced(#[case] accessors: &str) {
    let text = format!("CLASS c:\n  DEFINE PUBLIC PROPERTY Name AS CHARACTER NO-UNDO\n  {accessors}END CLASS.\n");
    let result = parse_source(&text);
    assert!(result.is_ok(), "{:?}\n{text}", result.errors);
    assert_eq!(result.final_stack_depth, 1);
}

#[test]
fn test_faulting_statements_are_skipped() {
    let text = "PROCEDURE.\nPROCEDURE ok:\nEND PROCEDURE.\n&GLOBAL-DEFINE\n&UNDEFINE\nDISPLAY 1.\nFUNCTION later RETURNS LOGICAL:\nEND FUNCTION.\n";
    let result = parse_source(text);
    assert!(result.is_ok(), "{:?}", result.errors);
    let procedures: Vec<&str> = result.items_of("procedure").map(|i| i.name.as_str()).collect();
    assert_eq!(procedures, vec!["ok"]);
    assert_eq!(result.items_of("implementation").count(), 1);
    assert_eq!(result.items_of("preproc-variable").count(), 0);
    assert_eq!(result.final_stack_depth, 1);
}

#[test]
fn test_errors_do_not_stop_the_pass() {
    let result = parse_source("END.\nPROCEDURE after:\nEND PROCEDURE.\n");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.items_of("procedure").count(), 1);
}

#[test]
fn test_error_display_names_file_and_line() {
    let result = parse_source("\n\nEND.\n");
    assert_eq!(result.errors[0].to_string(), "<input>:3: END found with no block to close");
}

// =============================================================================
// ITEMS
// =============================================================================

#[test]
fn test_procedure_file_items() {
    let result = parse_source(PROCEDURE_FILE);
    let procedures: Vec<&str> = result.items_of("procedure").map(|i| i.name.as_str()).collect();
    assert_eq!(procedures, vec!["loadOrders", "logCount"]);

    let ItemKind::Procedure(log_count) = &result.items_of("procedure").nth(1).unwrap().kind else {
        panic!("not a procedure");
    };
    assert!(log_count.private);

    let prototype = result.items_of("prototype").next().unwrap();
    let ItemKind::Prototype(proto) = &prototype.kind else { panic!() };
    let implementation = result.item(proto.implementation.unwrap()).unwrap();
    assert_eq!(implementation.name, "orderTotal");

    let run = result.items_of("run").next().unwrap();
    assert_eq!(run.name, "logCount");
    assert_eq!(result.item(run.scope.unwrap()).unwrap().name, "loadOrders");
}

#[test]
fn test_class_file_items() {
    let result = parse_source(CLASS_FILE);
    let methods: Vec<&str> = result.items_of("method").map(|i| i.name.as_str()).collect();
    assert_eq!(methods, vec!["Order", "Total"]);
}

#[test]
fn test_trigger_inside_procedure() {
    let result = parse_source(APPBUILDER_FILE);
    let trigger = result.items_of("on").next().unwrap();
    let ItemKind::OnStatement(on) = &trigger.kind else { panic!() };
    assert!(on.has_block);
    assert_eq!(result.item(trigger.scope.unwrap()).unwrap().name, "initialize");

    let line = APPBUILDER_FILE.lines().position(|l| l.contains("APPLY")).unwrap() as u32;
    let frames = &result.line(line).unwrap().scope;
    assert!(frames.iter().any(|f| f.kind == ScopeKind::Trigger));
}
