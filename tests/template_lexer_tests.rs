//! Integration tests for the context-driven template lexer.

use lg::run_context::RunContext;
use lg::template::lexer::tokenize;
use lg::template::TemplateEngine;

fn engine() -> TemplateEngine<'static> {
    TemplateEngine::new(RunContext::new("/tmp/repo".into())).unwrap()
}

fn kinds(text: &str) -> Vec<&'static str> {
    let engine = engine();
    tokenize(text, engine.registry())
        .unwrap()
        .iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn plain_text_is_one_token() {
    let engine = engine();
    let tokens = tokenize("just some text, no markup", engine.registry()).unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].kind, "TEXT");
    assert_eq!(tokens[0].value, "just some text, no markup");
    assert_eq!(tokens[1].kind, "EOF");
}

#[test]
fn placeholder_enters_its_own_context() {
    assert_eq!(
        kinds("a${name}b"),
        vec![
            "TEXT",
            "PLACEHOLDER_START",
            "IDENTIFIER",
            "PLACEHOLDER_END",
            "TEXT",
            "EOF",
        ]
    );
}

#[test]
fn directive_tokens_are_scoped_to_directives() {
    assert_eq!(
        kinds("{% if tag:x %}"),
        vec![
            "DIRECTIVE_START",
            "WHITESPACE",
            "IDENTIFIER",
            "WHITESPACE",
            "IDENTIFIER",
            "COLON",
            "IDENTIFIER",
            "WHITESPACE",
            "DIRECTIVE_END",
            "EOF",
        ]
    );
}

#[test]
fn comment_interior_is_raw_text() {
    let engine = engine();
    let tokens = tokenize("{# anything ${not} parsed #}", engine.registry()).unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec!["COMMENT_START", "TEXT", "COMMENT_END", "EOF"]);
    assert_eq!(tokens[1].value, " anything ${not} parsed ");
}

#[test]
fn stray_braces_are_literal_text() {
    let engine = engine();
    let tokens = tokenize("a } b { c % d $ e", engine.registry()).unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].value, "a } b { c % d $ e");
}

#[test]
fn dollar_without_brace_stays_text() {
    let engine = engine();
    let tokens = tokenize("price: $5 {not a directive}", engine.registry()).unwrap();
    assert_eq!(tokens[0].kind, "TEXT");
    assert_eq!(tokens[0].value, "price: $5 {not a directive}");
}

#[test]
fn closing_brace_inside_directive_is_not_a_placeholder_end() {
    // `}` has no meaning inside {% ... %}; only %} closes it
    assert_eq!(
        kinds("{% mode a:b %}x{% endmode %}"),
        vec![
            "DIRECTIVE_START",
            "WHITESPACE",
            "IDENTIFIER",
            "WHITESPACE",
            "IDENTIFIER",
            "COLON",
            "IDENTIFIER",
            "WHITESPACE",
            "DIRECTIVE_END",
            "TEXT",
            "DIRECTIVE_START",
            "WHITESPACE",
            "IDENTIFIER",
            "WHITESPACE",
            "DIRECTIVE_END",
            "EOF",
        ]
    );
}

#[test]
fn positions_track_lines_and_columns() {
    let engine = engine();
    let tokens = tokenize("ab\ncd${x}", engine.registry()).unwrap();
    let start = tokens.iter().find(|t| t.kind == "PLACEHOLDER_START").unwrap();
    assert_eq!((start.line, start.column), (2, 3));
    assert_eq!(start.offset, 5);
}

#[test]
fn unterminated_placeholder_is_a_lex_error() {
    let engine = engine();
    let err = tokenize("text ${name", engine.registry()).unwrap_err();
    assert!(err.to_string().contains("PLACEHOLDER_END"));
}

#[test]
fn unterminated_comment_is_a_lex_error() {
    let engine = engine();
    let err = tokenize("{# never closed", engine.registry()).unwrap_err();
    assert!(err.to_string().contains("COMMENT_END"));
}

#[test]
fn newline_inside_placeholder_is_rejected() {
    let engine = engine();
    assert!(tokenize("${na\nme}", engine.registry()).is_err());
}

#[test]
fn md_tokens_are_available_inside_placeholders() {
    assert_eq!(
        kinds("${md:docs/*,level:3}"),
        vec![
            "PLACEHOLDER_START",
            "IDENTIFIER",
            "COLON",
            "IDENTIFIER",
            "GLOB_STAR",
            "COMMA",
            "IDENTIFIER",
            "COLON",
            "NUMBER",
            "PLACEHOLDER_END",
            "EOF",
        ]
    );
}
