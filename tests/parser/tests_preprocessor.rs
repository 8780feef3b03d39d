//! Preprocessor directives and references.

use abl::parser::{parse, ItemKind, ParseEnvironment, ParseResult, ParserOptions, PreprocessorEnv};
use rstest::rstest;

use crate::helpers::resolvers::{env_with, parse_source, MemoryResolver};

fn procedures(result: &ParseResult) -> Vec<&str> {
    result.items_of("procedure").map(|i| i.name.as_str()).collect()
}

fn expanded(result: &ParseResult) -> String {
    result
        .tokens
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|t| t.text.as_str())
        .collect()
}

fn keep_text(env: ParseEnvironment) -> ParseEnvironment {
    env.with_options(ParserOptions::new().with_keep_expanded_text(true))
}

#[rstest]
#[case("&IF TRUE &THEN\nPROCEDURE a:\nEND.\n&ELSE\nPROCEDURE b:\nEND.\n&ENDIF\n", vec!["a"])]
#[case("&IF FALSE &THEN\nPROCEDURE a:\nEND.\n&ELSE\nPROCEDURE b:\nEND.\n&ENDIF\n", vec!["b"])]
#[case(
    "&IF 1 = 2 &THEN\nPROCEDURE a:\nEND.\n&ELSEIF 2 = 2 &THEN\nPROCEDURE b:\nEND.\n&ELSE\nPROCEDURE c:\nEND.\n&ENDIF\n",
    vec!["b"]
)]
#[case("&IF 1 = 1 &THEN\nPROCEDURE a:\nEND.\n&ELSEIF TRUE &THEN\nPROCEDURE b:\nEND.\n&ENDIF\n", vec!["a"])]
#[case("&SCOPED-DEFINE mode 3\n&IF {&mode} = 3 &THEN\nPROCEDURE a:\nEND.\n&ENDIF\n", vec!["a"])]
#[case("&IF DEFINED(nothing) = 0 &THEN\nPROCEDURE a:\nEND.\n&ENDIF\n", vec!["a"])]
#[case::else_after_nested_if_in_taken_branch(
    "&IF TRUE &THEN\n&IF FALSE &THEN\n&ENDIF\n&ELSE\nPROCEDURE b:\nEND.\n&ENDIF\n",
    vec![]
)]
#[case::else_after_nested_if_in_false_branch(
    "&IF FALSE &THEN\n&IF TRUE &THEN\nPROCEDURE a:\nEND.\n&ENDIF\n&ELSE\nPROCEDURE b:\nEND.\n&ENDIF\n",
    vec!["b"]
)]
#[case::nested_else_inside_false_branch(
    "&IF FALSE &THEN\n&IF FALSE &THEN\n&ELSE\nPROCEDURE a:\nEND.\n&ENDIF\n&ENDIF\nPROCEDURE c:\nEND.\n",
    vec!["c"]
)]
fn test_conditional_branches(#[case] text: &str, #[case] expected: Vec<&str>) {
    let result = parse_source(text);
    assert!(result.is_ok(), "{:?}", result.errors);
    assert_eq!(procedures(&result), expected);
}

#[test]
fn test_false_branch_lines_are_flagged() {
    let text = "&IF FALSE &THEN\nDISPLAY 1.\n&ENDIF\nDISPLAY 2.\n";
    let result = parse_source(text);
    let flags: Vec<bool> = result.line_info.iter().map(|l| l.in_false_branch).collect();
    assert_eq!(flags, vec![true, true, false, false, false]);
}

#[test]
fn test_reference_expands_into_statement() {
    let env = keep_text(ParseEnvironment::default());
    let result = parse(
        "&SCOPED-DEFINE proc-name worker\nPROCEDURE {&proc-name}:\nEND PROCEDURE.\n",
        None,
        &env,
    );
    assert!(result.is_ok(), "{:?}", result.errors);
    assert_eq!(procedures(&result), vec!["worker"]);
    assert!(expanded(&result).contains("PROCEDURE worker:"));

    let usage = result.items_of("preproc-variable-use").next().unwrap();
    assert_eq!(usage.name, "proc-name");
    assert!(matches!(&usage.kind, ItemKind::PreprocVariableUse(u) if u.defined));
}

#[test]
fn test_global_define_visible_in_include_and_scoped_is_not_leaked() {
    let resolver = MemoryResolver::new().with_file(
        "inner.i",
        "&SCOPED-DEFINE local inner\nDISPLAY {&shared}.\n",
    );
    let env = keep_text(env_with(resolver));
    let result = parse(
        "&GLOBAL-DEFINE shared from-root\n{inner.i}\nDISPLAY {&local}0.\n",
        None,
        &env,
    );
    let text = expanded(&result);
    assert!(text.contains("DISPLAY from-root."), "{text}");
    assert!(text.contains("DISPLAY 0."), "{text}");
}

#[test]
fn test_undefine_removes_value() {
    let env = keep_text(ParseEnvironment::default());
    let result = parse("&SCOPED-DEFINE x 1\n&UNDEFINE x\nDISPLAY {&x}0.\n", None, &env);
    assert!(expanded(&result).contains("DISPLAY 0."));
    let undefine = result
        .items_of("preproc-variable")
        .find(|i| matches!(&i.kind, ItemKind::PreprocVariable(v) if v.undefine));
    assert!(undefine.is_some());
}

#[rstest]
#[case("{&OPSYS}", "UNIX")]
#[case("{&WINDOW-SYSTEM}", "TTY")]
#[case("{&BATCH-MODE}", "yes")]
#[case("{&LINE-NUMBER}", "1")]
#[case("{&SEQUENCE} {&SEQUENCE}", "0 1")]
fn test_builtin_references(#[case] reference: &str, #[case] value: &str) {
    let options = ParserOptions::new()
        .with_keep_expanded_text(true)
        .with_preprocessor(PreprocessorEnv {
            opsys: "UNIX".to_string(),
            window_system: "TTY".to_string(),
            batch_mode: true,
            ..PreprocessorEnv::default()
        });
    let env = ParseEnvironment::default().with_options(options);
    let result = parse(&format!("x = {reference}.\n"), None, &env);
    assert_eq!(expanded(&result), format!("x = {value}.\n"));
}

#[test]
fn test_preprocessor_lines_stay_in_line_info() {
    let text = "&GLOBAL-DEFINE list a ~\n  b ~\n  c\nDISPLAY {&list}.\n";
    let result = parse_source(text);
    assert_eq!(result.line_info.len(), 5);
    let define = result.items_of("preproc-variable").next().unwrap();
    let ItemKind::PreprocVariable(variable) = &define.kind else { panic!() };
    assert!(variable.global);
}

#[test]
fn test_long_run_of_empty_references_is_fully_expanded() {
    let env = keep_text(ParseEnvironment::default());
    let text = format!("&SCOPED-DEFINE e\n{}DISPLAY 1.\n", "{&e}".repeat(100));
    let result = parse(&text, None, &env);
    let expanded = expanded(&result);
    assert!(!expanded.contains("{&e}"), "{expanded}");
    assert!(expanded.ends_with("DISPLAY 1.\n"), "{expanded}");
    assert_eq!(result.items_of("preproc-variable-use").count(), 100);
}
