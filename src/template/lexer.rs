//! Context-driven template lexer.
//!
//! A small stack machine: at the top level everything is TEXT until the
//! opener of a registered token context matches. Inside a context, only
//! that context's closers and inner tokens are recognized, so a `}` in a
//! directive body cannot terminate a placeholder and vice versa. The TEXT
//! boundary is computed against the registered openers themselves, which
//! keeps the two in sync by construction.

use super::registry::{Registry, TokenContext, TokenSpec};
use super::tokens::{Token, TEXT};
use super::LexerError;

pub struct TemplateLexer<'a> {
    text: &'a str,
    registry: &'a Registry,
    pos: usize,
    line: usize,
    column: usize,
}

/// Tokenizes a template, appending an EOF token.
pub fn tokenize(text: &str, registry: &Registry) -> Result<Vec<Token>, LexerError> {
    TemplateLexer::new(text, registry).tokenize()
}

impl<'a> TemplateLexer<'a> {
    pub fn new(text: &'a str, registry: &'a Registry) -> Self {
        Self {
            text,
            registry,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();

        while self.pos < self.text.len() {
            if let Some((context_index, token)) = self.try_open_context() {
                tokens.push(token);
                let context = self.registry.token_contexts()[context_index].clone();
                self.lex_context(&context, &mut tokens)?;
                continue;
            }
            let token = self.scan_text();
            tokens.push(token);
        }

        tokens.push(Token::eof(self.line, self.column, self.pos));
        Ok(tokens)
    }

    /// Tries every context opener at the current position, in context
    /// registration order. Emits the opening token on a match.
    fn try_open_context(&mut self) -> Option<(usize, Token)> {
        let registry = self.registry;
        for (index, context) in registry.token_contexts().iter().enumerate() {
            if let Some(token) = self.match_any(&context.open_tokens) {
                self.advance(token.value.len());
                return Some((index, token));
            }
        }
        None
    }

    fn opener_matches_here(&self) -> bool {
        self.registry
            .token_contexts()
            .iter()
            .any(|context| self.match_any(&context.open_tokens).is_some())
    }

    /// Accumulates a TEXT token up to the next opener or end of input.
    fn scan_text(&mut self) -> Token {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        while self.pos < self.text.len() && !self.opener_matches_here() {
            self.advance_one_char();
        }
        Token::new(TEXT, &self.text[start..self.pos], line, column, start)
    }

    fn lex_context(
        &mut self,
        context: &TokenContext,
        tokens: &mut Vec<Token>,
    ) -> Result<(), LexerError> {
        loop {
            if self.pos >= self.text.len() {
                return Err(LexerError::new(
                    format!(
                        "unexpected end of input inside '{}', expected {}",
                        context.name,
                        context.close_tokens.join(" or ")
                    ),
                    self.line,
                    self.column,
                    self.pos,
                ));
            }

            if let Some(token) = self.match_any(&context.close_tokens) {
                self.advance(token.value.len());
                tokens.push(token);
                return Ok(());
            }

            if context.inner_tokens.is_empty() {
                let token = self.scan_raw_until_close(context)?;
                tokens.push(token);
                continue;
            }

            if context.allow_nesting {
                if let Some(token) = self.match_any(&context.open_tokens) {
                    self.advance(token.value.len());
                    tokens.push(token);
                    self.lex_context(context, tokens)?;
                    continue;
                }
            }

            if let Some(token) = self.match_inner(context) {
                self.advance(token.value.len());
                tokens.push(token);
                continue;
            }

            let ch = self.text[self.pos..].chars().next().unwrap_or('\0');
            return Err(LexerError::new(
                format!("unexpected character {:?} in '{}'", ch, context.name),
                self.line,
                self.column,
                self.pos,
            ));
        }
    }

    /// Raw interior of a context without inner tokens (comments): TEXT up
    /// to the closer.
    fn scan_raw_until_close(&mut self, context: &TokenContext) -> Result<Token, LexerError> {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        while self.pos < self.text.len() {
            if self.match_any(&context.close_tokens).is_some() {
                return Ok(Token::new(TEXT, &self.text[start..self.pos], line, column, start));
            }
            self.advance_one_char();
        }
        Err(LexerError::new(
            format!(
                "unexpected end of input inside '{}', expected {}",
                context.name,
                context.close_tokens.join(" or ")
            ),
            line,
            column,
            start,
        ))
    }

    /// Matches any of the named token kinds at the current position.
    fn match_any(&self, names: &[&'static str]) -> Option<Token> {
        for name in names {
            let Some(spec) = self.registry.token_spec(name) else {
                continue;
            };
            if let Some(value) = self.match_spec(spec) {
                return Some(Token::new(spec.name, value, self.line, self.column, self.pos));
            }
        }
        None
    }

    /// Matches the context's inner tokens in priority order.
    fn match_inner(&self, context: &TokenContext) -> Option<Token> {
        for spec in self.registry.inner_specs(context) {
            if let Some(value) = self.match_spec(spec) {
                return Some(Token::new(spec.name, value, self.line, self.column, self.pos));
            }
        }
        None
    }

    fn match_spec(&self, spec: &TokenSpec) -> Option<String> {
        let m = spec.pattern.find_at(self.text, self.pos)?;
        if m.start() != self.pos || m.is_empty() {
            return None;
        }
        Some(m.as_str().to_string())
    }

    fn advance(&mut self, bytes: usize) {
        let end = self.pos + bytes;
        while self.pos < end {
            self.advance_one_char();
        }
    }

    fn advance_one_char(&mut self) {
        let Some(ch) = self.text[self.pos..].chars().next() else {
            return;
        };
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }
}
