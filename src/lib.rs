//! lg - template engine and context assembler for LLM prompts.
//!
//! Takes a repository of source files plus author-written template files
//! and produces a single rendered text artifact. The heart of the crate is
//! the template engine: a pipeline that tokenizes, parses, resolves, and
//! renders a small DSL embedded in Markdown files, with placeholders for
//! named content groups, textual inclusions across nested configuration
//! scopes, adaptive conditional blocks, and direct Markdown-file
//! placeholders with automatic heading normalization.
//!
//! # Pipeline
//!
//! ```text
//! template text
//!   -> lexer      (context-driven token stream)
//!   -> parser     (plugin parse rules -> AST)
//!   -> resolver   (cross-scope refs, includes, cycle detection)
//!   -> processor  (mode-stack rendering -> final string)
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use lg::run_context::RunContext;
//! use lg::template::TemplateEngine;
//!
//! let mut engine = TemplateEngine::new(RunContext::new("/repo".into()))?;
//! engine.set_section_handler(|section_ref, _ctx| {
//!     Ok(format!("<section {}>", section_ref.name))
//! });
//! let output = engine.render_context("default")?;
//! ```

pub mod cache;
pub mod conditions;
pub mod config;
pub mod markdown;
pub mod run_context;
pub mod sections;
pub mod template;

pub use cache::Cache;
pub use config::AdaptiveConfig;
pub use run_context::{RenderOptions, RunContext};
pub use sections::{SectionCfg, SectionRef};
pub use template::{TemplateEngine, TemplateError};
