//! Resolver pass.
//!
//! A depth-first rewrite between parsing and rendering: section references
//! gain their resolved scope, includes are loaded, parsed, and recursively
//! resolved with the origin stack pushed, inclusion cycles are rejected,
//! and resolved include ASTs are memoized by canonical key.
//!
//! Bare references resolve against the **current file's** origin, not the
//! root: entering an included file pushes its effective origin so that the
//! file's own unqualified references stay file-relative. That property is
//! what makes memoization by canonical key alone correct.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::run_context::SELF_ORIGIN;

use super::frontmatter::ContextFrontmatter;
use super::nodes::{
    ConditionalNode, ElifBranch, IncludeKind, ModeNode, TemplateAst, TemplateNode,
};
use super::registry::Registry;
use super::{ResolverError, TemplateError};

/// A loaded, parsed, and resolved include.
#[derive(Debug, Clone)]
pub struct ResolvedInclude {
    pub origin: String,
    pub ast: TemplateAst,
    pub frontmatter: Option<ContextFrontmatter>,
}

pub struct Resolver<'a> {
    registry: &'a Registry,
    repo_root: PathBuf,
    origin_stack: Vec<String>,
    resolution_stack: Vec<String>,
    resolved_includes: HashMap<String, ResolvedInclude>,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a Registry, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            repo_root: repo_root.into(),
            origin_stack: vec![SELF_ORIGIN.to_string()],
            resolution_stack: Vec::new(),
            resolved_includes: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Origin of the file currently being resolved.
    pub fn current_origin(&self) -> &str {
        self.origin_stack
            .last()
            .map(String::as_str)
            .unwrap_or(SELF_ORIGIN)
    }

    /// Resolves a whole template AST.
    pub fn resolve_template(&mut self, ast: &[TemplateNode]) -> Result<TemplateAst, TemplateError> {
        self.resolve_nodes(ast)
    }

    /// Recursion entry point for plugin resolvers.
    pub fn resolve_nodes(&mut self, nodes: &[TemplateNode]) -> Result<TemplateAst, TemplateError> {
        nodes.iter().map(|node| self.resolve_node(node)).collect()
    }

    pub fn resolve_node(&mut self, node: &TemplateNode) -> Result<TemplateNode, TemplateError> {
        match node {
            // structural nodes: descend without evaluating conditions
            TemplateNode::Conditional(conditional) => {
                let body = self.resolve_nodes(&conditional.body)?;
                let mut elif_branches = Vec::with_capacity(conditional.elif_branches.len());
                for branch in &conditional.elif_branches {
                    elif_branches.push(ElifBranch {
                        condition_text: branch.condition_text.clone(),
                        condition: branch.condition.clone(),
                        body: self.resolve_nodes(&branch.body)?,
                    });
                }
                let else_body = match &conditional.else_body {
                    Some(nodes) => Some(self.resolve_nodes(nodes)?),
                    None => None,
                };
                Ok(TemplateNode::Conditional(ConditionalNode {
                    condition_text: conditional.condition_text.clone(),
                    condition: conditional.condition.clone(),
                    body,
                    elif_branches,
                    else_body,
                }))
            }
            TemplateNode::Mode(mode) => Ok(TemplateNode::Mode(ModeNode {
                modeset: mode.modeset.clone(),
                mode: mode.mode.clone(),
                body: self.resolve_nodes(&mode.body)?,
            })),
            other => {
                let func = self
                    .registry
                    .resolvers_for(other.kind())
                    .first()
                    .map(|rule| rule.func);
                match func {
                    Some(func) => func(self, other),
                    None => Ok(other.clone()),
                }
            }
        }
    }

    // --- include machinery used by plugin resolver rules ---

    /// True when the canonical key is already being resolved.
    pub fn is_resolving(&self, canon_key: &str) -> bool {
        self.resolution_stack.iter().any(|key| key == canon_key)
    }

    /// The cycle chain ending at `canon_key`, for error messages.
    pub fn cycle_chain(&self, canon_key: &str) -> String {
        let mut chain: Vec<&str> = self.resolution_stack.iter().map(String::as_str).collect();
        chain.push(canon_key);
        chain.join(" -> ")
    }

    pub fn cached_include(&self, canon_key: &str) -> Option<&ResolvedInclude> {
        self.resolved_includes.get(canon_key)
    }

    /// Loads, parses, and recursively resolves one include under its
    /// effective origin, memoizing the result. The resolution stack and
    /// origin stack are restored on every exit path.
    pub fn resolve_include_body(
        &mut self,
        canon_key: &str,
        kind: IncludeKind,
        name: &str,
        effective_origin: &str,
    ) -> Result<ResolvedInclude, TemplateError> {
        if let Some(cached) = self.resolved_includes.get(canon_key) {
            return Ok(cached.clone());
        }
        if self.is_resolving(canon_key) {
            return Err(ResolverError::new(
                format!("circular include detected: {}", self.cycle_chain(canon_key)),
                canon_key.to_string(),
            )
            .into());
        }

        debug!("resolving include {}", canon_key);
        self.resolution_stack.push(canon_key.to_string());
        self.origin_stack.push(effective_origin.to_string());
        let result = self.load_and_resolve(canon_key, kind, name, effective_origin);
        self.origin_stack.pop();
        self.resolution_stack.pop();

        let resolved = result?;
        self.resolved_includes
            .insert(canon_key.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn load_and_resolve(
        &mut self,
        canon_key: &str,
        kind: IncludeKind,
        name: &str,
        effective_origin: &str,
    ) -> Result<ResolvedInclude, TemplateError> {
        let cfg_root = super::common::cfg_root_for_origin(&self.repo_root, effective_origin)?;
        let (_path, raw_text) = super::common::load_from_cfg(&cfg_root, name, kind.suffix())
            .map_err(|err| {
                ResolverError::new(
                    format!("failed to load {}: {}", canon_key, err.message),
                    canon_key.to_string(),
                )
            })?;

        let (frontmatter, body) = super::frontmatter::parse_frontmatter(&raw_text);
        let child_ast = super::parser::parse_template(body, self.registry)?;
        let resolved_ast = self.resolve_nodes(&child_ast)?;

        Ok(ResolvedInclude {
            origin: effective_origin.to_string(),
            ast: resolved_ast,
            frontmatter,
        })
    }
}
