//! Template engine.
//!
//! A multi-stage pipeline over Markdown-embedded templates:
//!
//! 1. **Lexing** - a context-driven stack machine produces a flat token
//!    stream ([`lexer`]).
//! 2. **Parsing** - priority-ordered recursive descent over registered
//!    plugin rules builds an immutable AST ([`parser`]).
//! 3. **Resolution** - cross-scope references are rewritten, included
//!    templates are loaded and parsed, inclusion cycles are rejected
//!    ([`resolver`]).
//! 4. **Processing** - the resolved AST is rendered to the final string
//!    with mode-stack semantics ([`processor`]).
//!
//! Language features are contributed by plugins registered in the
//! [`registry`]; the core only knows how to drive the stages.

pub mod adaptive;
pub mod common;
pub mod common_placeholders;
pub mod context;
pub mod frontmatter;
pub mod lexer;
pub mod md_placeholders;
pub mod nodes;
pub mod parser;
pub mod processor;
pub mod registry;
pub mod resolver;
pub mod task_placeholder;
pub mod tokens;

mod engine;

pub use context::TemplateContext;
pub use engine::{TemplateDependencies, TemplateEngine};
pub use nodes::{NodeKind, TemplateAst, TemplateNode};
pub use processor::SectionHandler;

use crate::conditions::ConditionError;

use self::tokens::Token;

/// Lexical error with source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl LexerError {
    pub fn new(message: impl Into<String>, line: usize, column: usize, offset: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            offset,
        }
    }
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}:{}", self.message, self.line, self.column)
    }
}

impl std::error::Error for LexerError {}

/// Syntax error with the offending token's position and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub token_kind: String,
}

impl ParserError {
    pub fn at_token(message: impl Into<String>, token: &Token) -> Self {
        Self {
            message: message.into(),
            line: token.line,
            column: token.column,
            token_kind: token.kind.to_string(),
        }
    }

    /// Parser-level wrapper for a condition sub-language error.
    pub fn from_condition(err: &ConditionError, token: &Token) -> Self {
        Self::at_token(format!("invalid condition: {}", err), token)
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{} (token: {})",
            self.message, self.line, self.column, self.token_kind
        )
    }
}

impl std::error::Error for ParserError {}

/// Resolution failure: missing section or include, inclusion cycle, or a
/// scope escaping the repository. `context` names the canonical key or the
/// resolution path that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverError {
    pub message: String,
    pub context: String,
}

impl ResolverError {
    pub fn new(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: context.into(),
        }
    }
}

impl std::fmt::Display for ResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.context.is_empty() {
            write!(f, "resolver error: {}", self.message)
        } else {
            write!(f, "resolver error in {}: {}", self.context, self.message)
        }
    }
}

impl std::error::Error for ResolverError {}

/// Render-time failure, carrying the node kind and plugin it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    pub message: String,
    pub node_kind: Option<NodeKind>,
    pub plugin: Option<&'static str>,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            node_kind: None,
            plugin: None,
        }
    }

    pub fn for_node(message: impl Into<String>, node_kind: NodeKind, plugin: &'static str) -> Self {
        Self {
            message: message.into(),
            node_kind: Some(node_kind),
            plugin: Some(plugin),
        }
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(kind) = self.node_kind {
            write!(f, " (node: {})", kind.as_str())?;
        }
        if let Some(plugin) = self.plugin {
            write!(f, " (plugin: {})", plugin)?;
        }
        Ok(())
    }
}

impl std::error::Error for RenderError {}

/// Any failure of the template pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    Lexer(LexerError),
    Parser(ParserError),
    Resolver(ResolverError),
    Render(RenderError),
    /// Plugin registration conflict or misuse of the registry.
    Registry(String),
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::Lexer(err) => write!(f, "lexer error: {}", err),
            TemplateError::Parser(err) => write!(f, "parse error: {}", err),
            TemplateError::Resolver(err) => write!(f, "{}", err),
            TemplateError::Render(err) => write!(f, "render error: {}", err),
            TemplateError::Registry(msg) => write!(f, "registry error: {}", msg),
        }
    }
}

impl std::error::Error for TemplateError {}

impl From<LexerError> for TemplateError {
    fn from(err: LexerError) -> Self {
        TemplateError::Lexer(err)
    }
}

impl From<ParserError> for TemplateError {
    fn from(err: ParserError) -> Self {
        TemplateError::Parser(err)
    }
}

impl From<ResolverError> for TemplateError {
    fn from(err: ResolverError) -> Self {
        TemplateError::Resolver(err)
    }
}

impl From<RenderError> for TemplateError {
    fn from(err: RenderError) -> Self {
        TemplateError::Render(err)
    }
}
