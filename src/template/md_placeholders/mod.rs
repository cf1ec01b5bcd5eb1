//! Markdown-file placeholder plugin: `${md:path}` and friends.
//!
//! Supported forms:
//!
//! ```text
//! ${md:docs/guide}                  direct inclusion
//! ${md:docs/guide#Usage}            one section only
//! ${md:docs/guide,level:3,strip_h1:true}
//! ${md@apps/web:README}             addressed inclusion
//! ${md:docs/*}                      glob inclusion
//! ${md:notes,if:tag:internal}       guarded inclusion
//! ```
//!
//! Rendering goes through an ephemeral *virtual section*: the node plus the
//! surrounding heading context produce a one-shot section configuration
//! which the section handler renders like any other section.

pub mod heading_context;
pub mod parser_rules;
pub mod tokens;
pub mod virtual_sections;

use super::nodes::{NodeKind, TemplateNode};
use super::processor::{ProcessingContext, Processor};
use super::registry::{priority, ParsingRule, ProcessorRule, Registry, TemplatePlugin, TokenSpec};
use super::{RenderError, TemplateError};

pub struct MdPlaceholdersPlugin;

impl TemplatePlugin for MdPlaceholdersPlugin {
    fn name(&self) -> &'static str {
        "md_placeholders"
    }

    fn priority(&self) -> i32 {
        priority::PLACEHOLDER
    }

    fn register_tokens(&self) -> Vec<TokenSpec> {
        tokens::md_token_specs()
    }

    fn register_parser_rules(&self) -> Vec<ParsingRule> {
        vec![ParsingRule {
            name: "parse_md_placeholder",
            priority: priority::PLACEHOLDER,
            func: parser_rules::parse_md_placeholder,
        }]
    }

    fn register_processors(&self) -> Vec<ProcessorRule> {
        vec![ProcessorRule {
            plugin: "md_placeholders",
            node_kind: NodeKind::MarkdownFile,
            func: process_markdown_node,
        }]
    }

    /// The md tokens live inside the shared placeholder context.
    fn initialize(&self, registry: &mut Registry) {
        let _ = registry.register_tokens_in_context(
            super::common_placeholders::PLACEHOLDER_CONTEXT,
            &[
                tokens::HASH,
                tokens::COMMA,
                tokens::BOOL_TRUE,
                tokens::BOOL_FALSE,
                tokens::NUMBER,
                tokens::GLOB_STAR,
            ],
        );
    }
}

/// Renders a Markdown-file node: evaluates the guard, builds the virtual
/// section from the heading context, and hands it to the section handler.
/// The virtual-section slot is cleared on every exit path.
fn process_markdown_node(
    processor: &mut Processor<'_>,
    processing_context: &ProcessingContext<'_>,
) -> Result<String, TemplateError> {
    let TemplateNode::MarkdownFile(node) = processing_context.node() else {
        return Err(RenderError::new("expected markdown file node").into());
    };

    if let Some(condition) = &node.condition {
        let included = processor
            .context()
            .evaluate_condition_text(condition)
            .map_err(TemplateError::Render)?;
        if !included {
            return Ok(String::new());
        }
    }

    let heading_context = heading_context::detect_heading_context(
        processing_context.ast,
        processing_context.index,
    );

    let repo_root = processor.context_ref().run_ctx.root.clone();
    let current_origin = processor.context_ref().origin().to_string();
    let section_name = processor.context().next_virtual_name();

    let (section_cfg, section_ref) = virtual_sections::create_for_markdown_file(
        node,
        &repo_root,
        &current_origin,
        &heading_context,
        section_name,
    )
    .map_err(TemplateError::Render)?;

    processor.context().set_virtual_section(section_cfg);
    let result = processor.process_section_ref(&section_ref);
    processor.context().clear_virtual_section();
    result
}
