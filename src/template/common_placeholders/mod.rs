//! Core placeholder plugin: `${section}`, `${@origin:section}`,
//! `${tpl:name}`, and `${ctx:name}`.

pub mod parser_rules;
pub mod resolver_rules;

use super::nodes::{NodeKind, TemplateNode};
use super::processor::{ProcessingContext, Processor};
use super::registry::{
    priority, ParsingRule, ProcessorRule, Registry, ResolverRule, TemplatePlugin, TokenContext,
    TokenSpec,
};
use super::tokens::WHITESPACE;
use super::{RenderError, TemplateError};

pub const PLACEHOLDER_START: &str = "PLACEHOLDER_START";
pub const PLACEHOLDER_END: &str = "PLACEHOLDER_END";
pub const IDENTIFIER: &str = "IDENTIFIER";
pub const COLON: &str = "COLON";
pub const AT: &str = "AT";
pub const LBRACKET: &str = "LBRACKET";
pub const RBRACKET: &str = "RBRACKET";

/// Name of the shared placeholder token context other plugins extend.
pub const PLACEHOLDER_CONTEXT: &str = "placeholder";

pub struct CommonPlaceholdersPlugin;

impl TemplatePlugin for CommonPlaceholdersPlugin {
    fn name(&self) -> &'static str {
        "common_placeholders"
    }

    fn priority(&self) -> i32 {
        priority::PLACEHOLDER
    }

    fn register_tokens(&self) -> Vec<TokenSpec> {
        vec![
            TokenSpec::new(PLACEHOLDER_START, r"\$\{"),
            TokenSpec::new(PLACEHOLDER_END, r"\}"),
            TokenSpec::new(COLON, r":"),
            TokenSpec::new(AT, r"@"),
            TokenSpec::new(LBRACKET, r"\["),
            TokenSpec::new(RBRACKET, r"\]"),
            TokenSpec::new(WHITESPACE, r"[ \t]+"),
            // identifiers span path segments: letters, digits, _, -, /, .
            TokenSpec::new(IDENTIFIER, r"[A-Za-z0-9_\-/.]+"),
        ]
    }

    fn register_token_contexts(&self) -> Vec<TokenContext> {
        vec![TokenContext {
            name: PLACEHOLDER_CONTEXT,
            open_tokens: vec![PLACEHOLDER_START],
            close_tokens: vec![PLACEHOLDER_END],
            inner_tokens: vec![IDENTIFIER, COLON, AT, LBRACKET, RBRACKET, WHITESPACE],
            allow_nesting: false,
        }]
    }

    fn register_parser_rules(&self) -> Vec<ParsingRule> {
        vec![ParsingRule {
            name: "parse_placeholder",
            priority: priority::PLACEHOLDER,
            func: parser_rules::parse_placeholder,
        }]
    }

    fn register_processors(&self) -> Vec<ProcessorRule> {
        vec![
            ProcessorRule {
                plugin: "common_placeholders",
                node_kind: NodeKind::Text,
                func: process_text,
            },
            ProcessorRule {
                plugin: "common_placeholders",
                node_kind: NodeKind::Section,
                func: process_section,
            },
            ProcessorRule {
                plugin: "common_placeholders",
                node_kind: NodeKind::Include,
                func: process_include,
            },
        ]
    }

    fn register_resolvers(&self) -> Vec<ResolverRule> {
        vec![
            ResolverRule {
                plugin: "common_placeholders",
                node_kind: NodeKind::Section,
                func: resolver_rules::resolve_section,
            },
            ResolverRule {
                plugin: "common_placeholders",
                node_kind: NodeKind::Include,
                func: resolver_rules::resolve_include,
            },
        ]
    }

    fn initialize(&self, _registry: &mut Registry) {}
}

fn process_text(
    _processor: &mut Processor<'_>,
    processing_context: &ProcessingContext<'_>,
) -> Result<String, TemplateError> {
    match processing_context.node() {
        TemplateNode::Text(text) => Ok(text.text.clone()),
        other => Err(unexpected_node("text", other).into()),
    }
}

fn process_section(
    processor: &mut Processor<'_>,
    processing_context: &ProcessingContext<'_>,
) -> Result<String, TemplateError> {
    let TemplateNode::Section(section) = processing_context.node() else {
        return Err(unexpected_node("section", processing_context.node()).into());
    };
    let Some(section_ref) = &section.resolved_ref else {
        return Err(RenderError::new(format!(
            "unresolved section reference '{}'",
            section.section_name
        ))
        .into());
    };
    processor.process_section_ref(section_ref)
}

fn process_include(
    processor: &mut Processor<'_>,
    processing_context: &ProcessingContext<'_>,
) -> Result<String, TemplateError> {
    let TemplateNode::Include(include) = processing_context.node() else {
        return Err(unexpected_node("include", processing_context.node()).into());
    };
    let Some(children) = &include.children else {
        return Err(RenderError::new(format!(
            "unresolved include '{}'",
            include.canon_key()
        ))
        .into());
    };

    processor.context().enter_include_scope(&include.origin);
    let result = processor.process_nodes(children);
    let exited = processor.context().exit_include_scope();
    let body = result?;
    exited.map_err(TemplateError::Render)?;
    Ok(body)
}

fn unexpected_node(expected: &str, node: &TemplateNode) -> RenderError {
    RenderError::new(format!(
        "expected {} node, got {}",
        expected,
        node.kind().as_str()
    ))
}
