//! Adaptive plugin: `{% if %}`/`{% elif %}`/`{% else %}`/`{% endif %}`
//! conditionals, `{% mode modeset:mode %}` blocks, and `{# ... #}`
//! comments.

pub mod parser_rules;
pub mod processor_rules;
pub mod tokens;

use super::nodes::NodeKind;
use super::registry::{
    priority, ParsingRule, ProcessorRule, Registry, TemplatePlugin, TokenContext, TokenSpec,
};

pub struct AdaptivePlugin;

impl TemplatePlugin for AdaptivePlugin {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn priority(&self) -> i32 {
        priority::DIRECTIVE
    }

    fn register_tokens(&self) -> Vec<TokenSpec> {
        tokens::adaptive_token_specs()
    }

    fn register_token_contexts(&self) -> Vec<TokenContext> {
        vec![
            TokenContext {
                name: "directive",
                open_tokens: vec![tokens::DIRECTIVE_START],
                close_tokens: vec![tokens::DIRECTIVE_END],
                inner_tokens: vec![
                    super::common_placeholders::IDENTIFIER,
                    super::common_placeholders::COLON,
                    tokens::LPAREN,
                    tokens::RPAREN,
                    super::tokens::WHITESPACE,
                ],
                allow_nesting: false,
            },
            // everything between {# and #} is raw text
            TokenContext {
                name: "comment",
                open_tokens: vec![tokens::COMMENT_START],
                close_tokens: vec![tokens::COMMENT_END],
                inner_tokens: vec![],
                allow_nesting: false,
            },
        ]
    }

    fn register_parser_rules(&self) -> Vec<ParsingRule> {
        vec![
            ParsingRule {
                name: "parse_directive",
                priority: priority::DIRECTIVE,
                func: parser_rules::parse_directive,
            },
            ParsingRule {
                name: "parse_comment",
                priority: priority::COMMENT,
                func: parser_rules::parse_comment,
            },
        ]
    }

    fn register_processors(&self) -> Vec<ProcessorRule> {
        vec![
            ProcessorRule {
                plugin: "adaptive",
                node_kind: NodeKind::Conditional,
                func: processor_rules::process_conditional,
            },
            ProcessorRule {
                plugin: "adaptive",
                node_kind: NodeKind::Mode,
                func: processor_rules::process_mode_block,
            },
            ProcessorRule {
                plugin: "adaptive",
                node_kind: NodeKind::Comment,
                func: processor_rules::process_comment,
            },
        ]
    }

    fn initialize(&self, _registry: &mut Registry) {}
}
