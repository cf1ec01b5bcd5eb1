//! Plugin registry.
//!
//! Plugins contribute token kinds, token contexts, parse rules, processors,
//! and resolvers. The registry owns all of them and fixes the dispatch
//! order: parse rules by priority descending (ties by registration order),
//! processors and resolvers per node kind in registration order with the
//! first registration winning.

use std::collections::HashMap;

use log::{debug, warn};
use regex::Regex;

use super::nodes::{NodeKind, TemplateNode};
use super::parser::ParsingContext;
use super::processor::{ProcessingContext, Processor};
use super::resolver::Resolver;
use super::tokens::TokenKindName;
use super::TemplateError;

/// Well-known rule and plugin priorities.
pub mod priority {
    pub const DIRECTIVE: i32 = 100;
    pub const TASK: i32 = 95;
    pub const PLACEHOLDER: i32 = 90;
    pub const COMMENT: i32 = 80;
    /// Default priority of a token spec.
    pub const TOKEN_DEFAULT: i32 = 50;
}

/// A registered token pattern. Patterns are matched anchored at the
/// current lexer position.
pub struct TokenSpec {
    pub name: TokenKindName,
    pub pattern: Regex,
    pub priority: i32,
}

impl TokenSpec {
    pub fn new(name: TokenKindName, pattern: &str) -> Self {
        Self::with_priority(name, pattern, priority::TOKEN_DEFAULT)
    }

    pub fn with_priority(name: TokenKindName, pattern: &str, priority: i32) -> Self {
        Self {
            name,
            // token patterns are static strings owned by plugins
            pattern: Regex::new(pattern).expect("invalid token pattern"),
            priority,
        }
    }
}

/// A named lexing context delimited by opening and closing token kinds.
/// Inside the context only `inner_tokens` (plus the closers) are
/// recognized; an empty inner set makes the interior raw text.
#[derive(Debug, Clone)]
pub struct TokenContext {
    pub name: &'static str,
    pub open_tokens: Vec<TokenKindName>,
    pub close_tokens: Vec<TokenKindName>,
    pub inner_tokens: Vec<TokenKindName>,
    pub allow_nesting: bool,
}

/// A parse rule: asked, in priority order, whether it can consume the
/// current token position. Returning `Ok(None)` declines and must leave
/// the cursor unchanged.
pub type ParseRuleFn = fn(&mut ParsingContext<'_>) -> Result<Option<TemplateNode>, TemplateError>;

pub struct ParsingRule {
    pub name: &'static str,
    pub priority: i32,
    pub func: ParseRuleFn,
}

/// Renders one node; recursion goes through the [`Processor`].
pub type ProcessorFn =
    fn(&mut Processor<'_>, &ProcessingContext<'_>) -> Result<String, TemplateError>;

pub struct ProcessorRule {
    pub plugin: &'static str,
    pub node_kind: NodeKind,
    pub func: ProcessorFn,
}

/// Rewrites one node during resolution; recursion goes through the
/// [`Resolver`].
pub type ResolverFn = fn(&mut Resolver<'_>, &TemplateNode) -> Result<TemplateNode, TemplateError>;

pub struct ResolverRule {
    pub plugin: &'static str,
    pub node_kind: NodeKind,
    pub func: ResolverFn,
}

/// A language feature bundle.
pub trait TemplatePlugin {
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32;

    fn register_tokens(&self) -> Vec<TokenSpec> {
        Vec::new()
    }

    fn register_token_contexts(&self) -> Vec<TokenContext> {
        Vec::new()
    }

    fn register_parser_rules(&self) -> Vec<ParsingRule> {
        Vec::new()
    }

    fn register_processors(&self) -> Vec<ProcessorRule> {
        Vec::new()
    }

    fn register_resolvers(&self) -> Vec<ResolverRule> {
        Vec::new()
    }

    /// Called once after every plugin has registered, in descending plugin
    /// priority. A plugin may extend other plugins' token contexts here.
    fn initialize(&self, _registry: &mut Registry) {}
}

/// Central registry of all template-engine components.
#[derive(Default)]
pub struct Registry {
    tokens: Vec<TokenSpec>,
    token_index: HashMap<TokenKindName, usize>,
    contexts: Vec<TokenContext>,
    parser_rules: Vec<ParsingRule>,
    rule_index: HashMap<&'static str, usize>,
    processors: Vec<ProcessorRule>,
    resolvers: Vec<ResolverRule>,
    plugin_names: Vec<&'static str>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin's components. Duplicate plugin names are
    /// rejected; duplicate token or rule names are overwritten with a
    /// warning (later wins).
    pub fn register_plugin(&mut self, plugin: &dyn TemplatePlugin) -> Result<(), TemplateError> {
        if self.plugin_names.contains(&plugin.name()) {
            return Err(TemplateError::Registry(format!(
                "plugin '{}' already registered",
                plugin.name()
            )));
        }
        debug!("registering plugin: {}", plugin.name());
        self.plugin_names.push(plugin.name());

        for spec in plugin.register_tokens() {
            self.register_token(plugin.name(), spec);
        }
        for context in plugin.register_token_contexts() {
            debug!(
                "registered token context '{}' from plugin '{}'",
                context.name,
                plugin.name()
            );
            self.contexts.push(context);
        }
        for rule in plugin.register_parser_rules() {
            self.register_parser_rule(plugin.name(), rule);
        }
        for rule in plugin.register_processors() {
            if self
                .processors
                .iter()
                .any(|existing| existing.node_kind == rule.node_kind)
            {
                warn!(
                    "processor for {:?} from plugin '{}' shadowed by an earlier registration",
                    rule.node_kind,
                    plugin.name()
                );
            }
            self.processors.push(rule);
        }
        for rule in plugin.register_resolvers() {
            self.resolvers.push(rule);
        }
        Ok(())
    }

    fn register_token(&mut self, plugin: &str, spec: TokenSpec) {
        if let Some(&index) = self.token_index.get(spec.name) {
            warn!(
                "token '{}' from plugin '{}' overwrites an existing token",
                spec.name, plugin
            );
            self.tokens[index] = spec;
            return;
        }
        self.token_index.insert(spec.name, self.tokens.len());
        self.tokens.push(spec);
    }

    fn register_parser_rule(&mut self, plugin: &str, rule: ParsingRule) {
        if let Some(&index) = self.rule_index.get(rule.name) {
            warn!(
                "parser rule '{}' from plugin '{}' overwrites an existing rule",
                rule.name, plugin
            );
            self.parser_rules[index] = rule;
            return;
        }
        self.rule_index.insert(rule.name, self.parser_rules.len());
        self.parser_rules.push(rule);
    }

    /// Runs every plugin's `initialize` hook in descending priority.
    pub fn initialize_plugins(&mut self, plugins: &[&dyn TemplatePlugin]) {
        let mut sorted: Vec<&&dyn TemplatePlugin> = plugins.iter().collect();
        sorted.sort_by_key(|p| std::cmp::Reverse(p.priority()));
        for plugin in sorted {
            plugin.initialize(self);
        }
    }

    /// Adds token kinds to an existing context's inner set.
    pub fn register_tokens_in_context(
        &mut self,
        context_name: &str,
        token_names: &[TokenKindName],
    ) -> Result<(), TemplateError> {
        let context = self
            .contexts
            .iter_mut()
            .find(|c| c.name == context_name)
            .ok_or_else(|| {
                TemplateError::Registry(format!("token context '{}' not found", context_name))
            })?;
        for name in token_names {
            if !context.inner_tokens.contains(name) {
                context.inner_tokens.push(name);
            }
        }
        debug!(
            "added {} token(s) to context '{}'",
            token_names.len(),
            context_name
        );
        Ok(())
    }

    pub fn token_spec(&self, name: TokenKindName) -> Option<&TokenSpec> {
        self.token_index.get(name).map(|&i| &self.tokens[i])
    }

    pub fn token_contexts(&self) -> &[TokenContext] {
        &self.contexts
    }

    /// Parse rules in dispatch order: priority descending, registration
    /// order within a priority.
    pub fn sorted_parser_rules(&self) -> Vec<&ParsingRule> {
        let mut rules: Vec<&ParsingRule> = self.parser_rules.iter().collect();
        rules.sort_by_key(|r| std::cmp::Reverse(r.priority));
        rules
    }

    /// The winning processor for a node kind (first registration).
    pub fn processor_for(&self, kind: NodeKind) -> Option<&ProcessorRule> {
        self.processors.iter().find(|rule| rule.node_kind == kind)
    }

    /// Resolvers for a node kind, in registration order.
    pub fn resolvers_for(&self, kind: NodeKind) -> Vec<&ResolverRule> {
        self.resolvers
            .iter()
            .filter(|rule| rule.node_kind == kind)
            .collect()
    }

    /// Token specs of a context's inner set, in dispatch order.
    pub fn inner_specs(&self, context: &TokenContext) -> Vec<&TokenSpec> {
        let mut specs: Vec<(usize, &TokenSpec)> = context
            .inner_tokens
            .iter()
            .filter_map(|name| {
                self.token_index
                    .get(name)
                    .map(|&index| (index, &self.tokens[index]))
            })
            .collect();
        // priority descending, then registration order
        specs.sort_by_key(|(index, spec)| (std::cmp::Reverse(spec.priority), *index));
        specs.into_iter().map(|(_, spec)| spec).collect()
    }
}
