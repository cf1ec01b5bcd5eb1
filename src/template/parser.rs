//! Template parser.
//!
//! The main loop asks every registered parse rule, in priority order,
//! whether it can consume the current position; the first rule returning a
//! node wins. Unclaimed tokens fall back to TEXT nodes, coalesced with an
//! adjacent preceding text node to keep the AST compact.

use super::lexer::tokenize;
use super::nodes::{TemplateAst, TemplateNode};
use super::registry::Registry;
use super::tokens::{Token, TokenKindName};
use super::{ParserError, TemplateError};

/// Cursor over the token stream handed to parse rules.
///
/// Rules mutate only the position; a rule that declines must leave the
/// cursor where it found it (`parse_next_node` restores it as a backstop).
pub struct ParsingContext<'a> {
    tokens: &'a [Token],
    pub position: usize,
    registry: &'a Registry,
}

impl<'a> ParsingContext<'a> {
    pub fn new(tokens: &'a [Token], registry: &'a Registry) -> Self {
        Self {
            tokens,
            position: 0,
            registry,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn current(&self) -> &Token {
        // tokenize() always appends EOF
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub fn peek(&self, offset: usize) -> &Token {
        let index = self.position + offset;
        &self.tokens[index.min(self.tokens.len() - 1)]
    }

    pub fn is_at_end(&self) -> bool {
        self.current().is_eof()
    }

    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    /// True when the current token is of the given kind.
    pub fn matches(&self, kind: TokenKindName) -> bool {
        self.current().kind == kind
    }

    /// True when the current token is any of the given kinds.
    pub fn matches_any(&self, kinds: &[TokenKindName]) -> bool {
        kinds.iter().any(|kind| self.matches(kind))
    }

    /// Consumes a token of the expected kind or fails with a
    /// position-bearing error.
    pub fn consume(&mut self, expected: TokenKindName) -> Result<Token, ParserError> {
        if self.matches(expected) {
            Ok(self.advance())
        } else {
            Err(ParserError::at_token(
                format!("expected {}", expected),
                self.current(),
            ))
        }
    }

    pub fn skip_whitespace(&mut self) {
        while self.matches(super::tokens::WHITESPACE) {
            self.advance();
        }
    }

    /// Dispatches the registered parse rules at the current position.
    ///
    /// Returns the first rule's node, or a TEXT node for an unclaimed
    /// token. `Ok(None)` only at end of input.
    pub fn parse_next_node(&mut self) -> Result<Option<TemplateNode>, TemplateError> {
        if self.is_at_end() {
            return Ok(None);
        }

        let registry = self.registry;
        for rule in registry.sorted_parser_rules() {
            let saved = self.position;
            match (rule.func)(self)? {
                Some(node) => return Ok(Some(node)),
                None => self.position = saved,
            }
        }

        let token = self.advance();
        Ok(Some(TemplateNode::text(token.value)))
    }
}

/// Appends a node, merging adjacent text fragments.
pub fn push_coalescing(ast: &mut TemplateAst, node: TemplateNode) {
    if let (Some(TemplateNode::Text(last)), TemplateNode::Text(next)) = (ast.last_mut(), &node) {
        last.text.push_str(&next.text);
        return;
    }
    ast.push(node);
}

/// Lexes and parses a template into its AST.
pub fn parse_template(text: &str, registry: &Registry) -> Result<TemplateAst, TemplateError> {
    let tokens = tokenize(text, registry)?;
    let mut context = ParsingContext::new(&tokens, registry);
    let mut ast = TemplateAst::new();
    while let Some(node) = context.parse_next_node()? {
        push_coalescing(&mut ast, node);
    }
    Ok(ast)
}
