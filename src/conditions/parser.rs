//! Recursive-descent parser for condition expressions.
//!
//! Grammar (NOT is right-associative, AND binds tighter than OR, both
//! binary operators are left-associative):
//!
//! ```text
//! expr     := or_expr
//! or_expr  := and_expr ( "OR" and_expr )*
//! and_expr := not_expr ( "AND" not_expr )*
//! not_expr := "NOT" not_expr | primary
//! primary  := "(" expr ")" | tag_cond | tagset_cond | scope_cond | "task"
//! ```

use super::lexer::{tokenize, Token, TokenKind};
use super::model::{Condition, ScopeKind};
use super::ConditionError;

pub struct ConditionParser {
    tokens: Vec<Token>,
    position: usize,
}

impl ConditionParser {
    pub fn parse(text: &str) -> Result<Condition, ConditionError> {
        let tokens = tokenize(text)?;
        let mut parser = Self {
            tokens,
            position: 0,
        };

        if parser.is_at_end() {
            return Err(ConditionError::new("empty condition", 0));
        }

        let result = parser.parse_expression()?;

        if !parser.is_at_end() {
            let current = parser.current();
            return Err(ConditionError::new(
                format!("unexpected token '{}'", current.value),
                current.position,
            ));
        }

        Ok(result)
    }

    fn parse_expression(&mut self) -> Result<Condition, ConditionError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Condition, ConditionError> {
        let mut left = self.parse_and()?;
        while self.match_keyword("OR") {
            let right = self.parse_and()?;
            left = Condition::Or {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Condition, ConditionError> {
        let mut left = self.parse_not()?;
        while self.match_keyword("AND") {
            let right = self.parse_not()?;
            left = Condition::And {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Condition, ConditionError> {
        if self.match_keyword("NOT") {
            let inner = self.parse_not()?;
            return Ok(Condition::Not {
                inner: Box::new(inner),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Condition, ConditionError> {
        if self.match_symbol("(") {
            let inner = self.parse_expression()?;
            if !self.match_symbol(")") {
                return Err(ConditionError::new(
                    "expected ')' after grouped expression",
                    self.current_position(),
                ));
            }
            return Ok(Condition::Group {
                inner: Box::new(inner),
            });
        }

        if self.match_keyword("tag") {
            return self.parse_tag();
        }
        if self.match_keyword("TAGSET") {
            return self.parse_tagset();
        }
        if self.match_keyword("scope") {
            return self.parse_scope();
        }
        if self.match_keyword("task") {
            return Ok(Condition::Task);
        }

        let current = self.current();
        if current.kind == TokenKind::Eof {
            Err(ConditionError::new(
                "unexpected end of expression",
                current.position,
            ))
        } else {
            Err(ConditionError::new(
                format!("unexpected token '{}'", current.value),
                current.position,
            ))
        }
    }

    fn parse_tag(&mut self) -> Result<Condition, ConditionError> {
        if !self.match_symbol(":") {
            return Err(ConditionError::new(
                "expected ':' after 'tag'",
                self.current_position(),
            ));
        }
        let name = self.consume_identifier("expected tag name after 'tag:'")?;
        Ok(Condition::Tag { name: name.value })
    }

    fn parse_tagset(&mut self) -> Result<Condition, ConditionError> {
        if !self.match_symbol(":") {
            return Err(ConditionError::new(
                "expected ':' after 'TAGSET'",
                self.current_position(),
            ));
        }
        let set_name = self.consume_identifier("expected set name after 'TAGSET:'")?;
        if !self.match_symbol(":") {
            return Err(ConditionError::new(
                "expected ':' after set name",
                self.current_position(),
            ));
        }
        let tag_name = self.consume_identifier("expected tag name after set name")?;
        Ok(Condition::TagSet {
            set_name: set_name.value,
            tag_name: tag_name.value,
        })
    }

    fn parse_scope(&mut self) -> Result<Condition, ConditionError> {
        if !self.match_symbol(":") {
            return Err(ConditionError::new(
                "expected ':' after 'scope'",
                self.current_position(),
            ));
        }
        let kind_token = self.consume_identifier("expected scope type after 'scope:'")?;
        let scope = match kind_token.value.as_str() {
            "local" => ScopeKind::Local,
            "parent" => ScopeKind::Parent,
            other => {
                return Err(ConditionError::new(
                    format!("invalid scope type '{}', expected 'local' or 'parent'", other),
                    kind_token.position,
                ))
            }
        };
        Ok(Condition::Scope { scope })
    }

    fn current(&self) -> &Token {
        // tokenize() always appends EOF, so the slice is never empty
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn current_position(&self) -> usize {
        self.current().position
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        let current = self.current();
        if current.kind == TokenKind::Keyword && current.value == keyword {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_symbol(&mut self, symbol: &str) -> bool {
        let current = self.current();
        if current.kind == TokenKind::Symbol && current.value == symbol {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_identifier(&mut self, message: &str) -> Result<Token, ConditionError> {
        if self.current().kind == TokenKind::Identifier {
            Ok(self.advance())
        } else {
            Err(ConditionError::new(message, self.current_position()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_binds_tighter_than_or() {
        let cond = ConditionParser::parse("tag:a OR tag:b AND tag:c").unwrap();
        match cond {
            Condition::Or { right, .. } => {
                assert!(matches!(*right, Condition::And { .. }));
            }
            other => panic!("expected Or at the root, got {:?}", other),
        }
    }

    #[test]
    fn not_is_right_associative() {
        let cond = ConditionParser::parse("NOT NOT tag:a").unwrap();
        match cond {
            Condition::Not { inner } => assert!(matches!(*inner, Condition::Not { .. })),
            other => panic!("expected Not, got {:?}", other),
        }
    }

    #[test]
    fn parses_parenthesized_groups() {
        let cond = ConditionParser::parse("(tag:a OR tag:b) AND tag:c").unwrap();
        match cond {
            Condition::And { left, .. } => assert!(matches!(*left, Condition::Group { .. })),
            other => panic!("expected And, got {:?}", other),
        }
    }

    #[test]
    fn parses_task_primary() {
        assert_eq!(ConditionParser::parse("task").unwrap(), Condition::Task);
    }

    #[test]
    fn rejects_empty_condition() {
        let err = ConditionParser::parse("   ").unwrap_err();
        assert!(err.message.contains("empty condition"));
    }

    #[test]
    fn rejects_unclosed_group() {
        let err = ConditionParser::parse("(tag:a OR tag:b").unwrap_err();
        assert!(err.message.contains("')'"));
    }

    #[test]
    fn rejects_invalid_scope() {
        let err = ConditionParser::parse("scope:global").unwrap_err();
        assert!(err.message.contains("invalid scope type"));
    }

    #[test]
    fn display_round_trips_source_shape() {
        let cond = ConditionParser::parse("NOT (tag:a AND TAGSET:lang:rust)").unwrap();
        assert_eq!(cond.to_string(), "NOT (tag:a AND TAGSET:lang:rust)");
    }
}
