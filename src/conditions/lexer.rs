//! Lexer for condition expressions.
//!
//! Greedy left-to-right scan producing keyword, identifier, and symbol
//! tokens. Whitespace is skipped. Identifiers are Unicode-aware words that
//! may contain digits, underscores, and hyphens; an identifier matching a
//! keyword exactly (case-sensitive) is promoted to keyword kind.

use super::ConditionError;

const KEYWORDS: &[&str] = &["tag", "TAGSET", "scope", "task", "AND", "OR", "NOT"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Symbol,
    Eof,
}

/// Token with its byte offset in the condition source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, value: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            position,
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-'
}

/// Tokenizes a condition string, appending an EOF token.
pub fn tokenize(text: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if matches!(ch, '(' | ')' | ':') {
            chars.next();
            tokens.push(Token::new(TokenKind::Symbol, ch, pos));
            continue;
        }

        if is_ident_start(ch) {
            let start = pos;
            let mut end = pos;
            while let Some(&(p, c)) = chars.peek() {
                if is_ident_continue(c) {
                    end = p + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let word = &text[start..end];
            let kind = if KEYWORDS.contains(&word) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            tokens.push(Token::new(kind, word, start));
            continue;
        }

        return Err(ConditionError::new(
            format!("unexpected character '{}'", ch),
            pos,
        ));
    }

    tokens.push(Token::new(TokenKind::Eof, "", text.len()));
    Ok(tokens)
}
