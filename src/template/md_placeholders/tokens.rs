//! Extra token kinds recognized inside `${md:...}` placeholders.

use super::super::registry::TokenSpec;

pub const HASH: &str = "HASH";
pub const COMMA: &str = "COMMA";
pub const BOOL_TRUE: &str = "BOOL_TRUE";
pub const BOOL_FALSE: &str = "BOOL_FALSE";
pub const NUMBER: &str = "NUMBER";
pub const GLOB_STAR: &str = "GLOB_STAR";

pub fn md_token_specs() -> Vec<TokenSpec> {
    vec![
        TokenSpec::new(HASH, r"#"),
        TokenSpec::new(COMMA, r","),
        // above the default so bare true/false and digits beat IDENTIFIER
        TokenSpec::with_priority(BOOL_TRUE, r"\btrue\b", 60),
        TokenSpec::with_priority(BOOL_FALSE, r"\bfalse\b", 60),
        TokenSpec::with_priority(NUMBER, r"\d+", 55),
        TokenSpec::new(GLOB_STAR, r"\*+"),
    ]
}
