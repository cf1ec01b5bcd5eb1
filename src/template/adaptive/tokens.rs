//! Token kinds for adaptive directives and comments.

use super::super::registry::TokenSpec;

pub const DIRECTIVE_START: &str = "DIRECTIVE_START";
pub const DIRECTIVE_END: &str = "DIRECTIVE_END";
pub const COMMENT_START: &str = "COMMENT_START";
pub const COMMENT_END: &str = "COMMENT_END";
pub const LPAREN: &str = "LPAREN";
pub const RPAREN: &str = "RPAREN";

pub fn adaptive_token_specs() -> Vec<TokenSpec> {
    vec![
        TokenSpec::new(DIRECTIVE_START, r"\{%"),
        TokenSpec::new(DIRECTIVE_END, r"%\}"),
        TokenSpec::new(COMMENT_START, r"\{#"),
        TokenSpec::new(COMMENT_END, r"#\}"),
        TokenSpec::new(LPAREN, r"\("),
        TokenSpec::new(RPAREN, r"\)"),
    ]
}
