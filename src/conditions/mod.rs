//! Condition sub-language for adaptive templates.
//!
//! A small boolean expression language evaluated against the active tag set,
//! tag-set families, the current scope, and task presence:
//!
//! ```text
//! tag:python AND (scope:local OR NOT TAGSET:detail:full)
//! ```
//!
//! The pipeline is lexer → recursive-descent parser → short-circuit
//! evaluator. Parsing is independent of any rendering state; evaluation is
//! pure and side-effect free.

pub mod evaluator;
pub mod lexer;
pub mod model;
pub mod parser;

pub use evaluator::{evaluate, evaluate_str, ConditionScope};
pub use lexer::{tokenize, Token, TokenKind};
pub use model::{Condition, ScopeKind};
pub use parser::ConditionParser;

/// Error raised while lexing or parsing a condition expression.
///
/// Positions are zero-based byte offsets into the condition source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionError {
    pub message: String,
    pub position: usize,
}

impl ConditionError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for ConditionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "condition error at position {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for ConditionError {}
