//! Lexical types for the template engine.
//!
//! Token kinds are open-ended: plugins register their own kinds by name.
//! Only `TEXT`, `WHITESPACE`, and `EOF` are built in.

use serde::Serialize;

/// Name of a token kind. Plugins use static names; the set is fixed at
/// registration time.
pub type TokenKindName = &'static str;

pub const TEXT: TokenKindName = "TEXT";
pub const WHITESPACE: TokenKindName = "WHITESPACE";
pub const EOF: TokenKindName = "EOF";

/// A token with position information for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKindName,
    pub value: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    /// 0-based byte offset in the source.
    pub offset: usize,
}

impl Token {
    pub fn new(
        kind: TokenKindName,
        value: impl Into<String>,
        line: usize,
        column: usize,
        offset: usize,
    ) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
            column,
            offset,
        }
    }

    pub fn eof(line: usize, column: usize, offset: usize) -> Self {
        Self::new(EOF, "", line, column, offset)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == EOF
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Token({}, {:?}, {}:{})",
            self.kind, self.value, self.line, self.column
        )
    }
}
