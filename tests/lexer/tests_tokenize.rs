//! Token stream invariants and token classification.

use abl::parser::{tokenize, TokenKind};
use proptest::prelude::*;
use rstest::rstest;

fn significant(input: &str) -> Vec<(TokenKind, String)> {
    tokenize(input)
        .into_iter()
        .filter(|t| !t.kind.is_trivia() && !t.is_eof())
        .map(|t| (t.kind, t.text.to_string()))
        .collect()
}

// =============================================================================
// STREAM INVARIANTS
// =============================================================================

fn check_stream(input: &str) -> Result<(), TestCaseError> {
    let tokens = tokenize(input);
    prop_assert!(!tokens.is_empty());
    prop_assert!(tokens.last().is_some_and(|t| t.is_eof()));

    let mut previous = 0u32;
    for token in &tokens {
        let start: u32 = token.range.start().into();
        prop_assert!(start >= previous, "offset went back at {:?}", token);
        previous = token.range.end().into();
    }

    let rebuilt: String = tokens.iter().map(|t| t.text.as_str()).collect();
    prop_assert_eq!(rebuilt, input);
    Ok(())
}

proptest! {
    #[test]
    fn test_any_text_round_trips(input in any::<String>()) {
        check_stream(&input)?;
    }

    #[test]
    fn test_abl_like_text_round_trips(
        input in r#"([A-Za-z\-]{1,8}|[ \t]|\r?\n|[.:,()=]|"[a-z ~"]*"?|/\*[a-z /*]*|\{&?[a-z0-9 ]*\}?|&[A-Z\-]{2,12}|[0-9]{1,3}){0,40}"#
    ) {
        check_stream(&input)?;
    }

    #[test]
    fn test_lines_follow_line_breaks(lines in prop::collection::vec("[a-z =.]{0,10}", 1..20)) {
        let input = lines.join("\n");
        let tokens = tokenize(&input);
        let eof = tokens.last().unwrap();
        prop_assert_eq!(eof.line as usize, lines.len() - 1);
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

#[rstest]
#[case("DISPLAY x.", vec![(TokenKind::Word, "DISPLAY"), (TokenKind::Word, "x"), (TokenKind::Eos, ".")])]
#[case("sports.customer.name", vec![(TokenKind::Word, "sports.customer.name")])]
#[case("DO:", vec![(TokenKind::Word, "DO"), (TokenKind::Eos, ":")])]
#[case("\"abc\":U", vec![(TokenKind::String, "\"abc\""), (TokenKind::StringDescriptor, ":U")])]
#[case("{&name}", vec![(TokenKind::PreprocVariable, "{&name}")])]
#[case("{1}", vec![(TokenKind::PreprocVariable, "{1}")])]
#[case("{inc.i a b}", vec![(TokenKind::Include, "{inc.i a b}")])]
#[case("&IF", vec![(TokenKind::PreprocDirective, "&IF")])]
#[case("12.5", vec![(TokenKind::Number, "12.5")])]
#[case("a <> b", vec![(TokenKind::Word, "a"), (TokenKind::Symbol, "<>"), (TokenKind::Word, "b")])]
fn test_token_kinds(#[case] input: &str, #[case] expected: Vec<(TokenKind, &str)>) {
    let expected: Vec<(TokenKind, String)> = expected.into_iter().map(|(k, t)| (k, t.to_string())).collect();
    assert_eq!(significant(input), expected);
}

#[rstest]
#[case("/* open")]
#[case("\"open")]
#[case("{inc.i")]
#[case("/* a /* nested */ still open")]
fn test_unterminated_constructs_run_to_end(#[case] input: &str) {
    let tokens = tokenize(input);
    assert_eq!(tokens.len(), 2, "{tokens:?}");
    assert_eq!(tokens[0].text, input);
}

#[test]
fn test_dot_before_space_ends_statement_but_not_inside_words() {
    let kinds: Vec<TokenKind> = significant("x = customer.name. y").into_iter().map(|(k, _)| k).collect();
    assert_eq!(kinds, vec![TokenKind::Word, TokenKind::Symbol, TokenKind::Word, TokenKind::Eos, TokenKind::Word]);
}
