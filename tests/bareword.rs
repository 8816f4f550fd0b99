//! Bareword recognition: classification, markers, spans, errors.

use slsh_syntax::{Error, NodeKind, Parser, SourceUnit, parse_str};

fn bareword(input: &str) -> slsh_syntax::Bareword {
    let node = parse_str("test", input).expect("parse failed");
    match node.kind {
        NodeKind::Bareword(word) => word,
        other => panic!("expected bareword, got {other:?}"),
    }
}

fn syntax_error(input: &str) -> slsh_syntax::SyntaxError {
    match parse_str("test", input).expect_err("parse should fail") {
        Error::Syntax(e) => e,
        Error::Internal(e) => panic!("internal error: {e}"),
    }
}

#[test]
fn plain_word() {
    let word = bareword("hello");
    assert_eq!(word.raw, "hello");
    assert!(!word.needs_tilde);
    assert!(!word.needs_wildcard);
}

#[test]
fn tilde_prefix() {
    let word = bareword("~213/123");
    assert_eq!(word.raw, "~213/123");
    assert!(word.needs_tilde);
    assert!(!word.needs_wildcard);
}

#[test]
fn tilde_alone() {
    let word = bareword("~");
    assert_eq!(word.raw, "~");
    assert!(word.needs_tilde);
}

#[test]
fn wildcard_anywhere() {
    let word = bareword("a*b*");
    assert_eq!(word.raw, "a*b*");
    assert!(word.needs_wildcard);
}

#[test]
fn tilde_and_wildcard() {
    let word = bareword("~/src/*.rs");
    assert!(word.needs_tilde);
    assert!(word.needs_wildcard);
}

#[test]
fn non_ascii_word() {
    let word = bareword("\u{00F9}\u{00D1}\u{00FB}");
    assert_eq!(word.raw, "\u{00F9}\u{00D1}\u{00FB}");
}

#[test]
fn ascii_punctuation_word() {
    // `@` carries no meaning but is printable, so it is ordinary.
    assert_eq!(bareword("@@@@").raw, "@@@@");
}

#[test]
fn operator_safe_punctuation() {
    assert_eq!(bareword("a!%+-,/\\_z").raw, "a!%+-,/\\_z");
}

#[test]
fn astral_codepoint_is_one_character() {
    let input = "a\u{1F600}b";
    let source = SourceUnit::new("test", input);
    let node = parse_str("test", input).expect("parse failed");
    assert_eq!(node.span.length, 3);
    assert_eq!(node.source_text(&source), input);
}

#[test]
fn full_span() {
    let input = "~213/123";
    let source = SourceUnit::new("test", input);
    let node = parse_str("test", input).expect("parse failed");
    assert_eq!(node.source_text(&source), input);
}

#[test]
fn ending_hint_is_not_consumed() {
    let source = SourceUnit::new("test", "ab|cd");
    let mut parser = Parser::new(&source);
    let node = parser.parse_bareword().expect("parse failed");
    match node.kind {
        NodeKind::Bareword(word) => assert_eq!(word.raw, "ab"),
        other => panic!("expected bareword, got {other:?}"),
    }
    assert_eq!(parser.offset(), 2);
}

#[test]
fn stops_at_whitespace() {
    let source = SourceUnit::new("test", "ab cd");
    let mut parser = Parser::new(&source);
    let node = parser.parse_bareword().expect("parse failed");
    assert_eq!(node.span.length, 2);
}

#[test]
fn misplaced_tilde() {
    let err = syntax_error("a~b");
    assert!(
        err.message
            .contains("tilde symbol can only be placed at the beginning")
    );
    assert_eq!(err.offset, 1);
}

#[test]
fn empty_bareword() {
    let source = SourceUnit::new("test", "|rest");
    let mut parser = Parser::new(&source);
    let err = match parser.parse_bareword().expect_err("should fail") {
        Error::Syntax(e) => e,
        Error::Internal(e) => panic!("internal error: {e}"),
    };
    assert_eq!(err.message, "unexpected empty bareword");
    assert_eq!(parser.offset(), 0);
}

#[test]
fn invalid_control_character() {
    let err = syntax_error("ab\u{0001}cd");
    assert_eq!(err.message, "invalid character in bareword");
    assert_eq!(err.offset, 2);
}
