//! Task placeholder plugin: `${task}` and `${task:prompt:"default"}`.
//!
//! Renders the host-supplied task text; the `prompt` form supplies a
//! fallback used when no task was given.

use super::nodes::{NodeKind, TaskNode, TemplateNode};
use super::parser::ParsingContext;
use super::processor::{ProcessingContext, Processor};
use super::registry::{priority, ParsingRule, ProcessorRule, Registry, TemplatePlugin, TokenSpec};
use super::{ParserError, RenderError, TemplateError};

pub const STRING_LITERAL: &str = "STRING_LITERAL";

const PLACEHOLDER_START: &str = super::common_placeholders::PLACEHOLDER_START;
const PLACEHOLDER_END: &str = super::common_placeholders::PLACEHOLDER_END;
const IDENTIFIER: &str = super::common_placeholders::IDENTIFIER;
const COLON: &str = super::common_placeholders::COLON;

pub struct TaskPlaceholderPlugin;

impl TemplatePlugin for TaskPlaceholderPlugin {
    fn name(&self) -> &'static str {
        "task_placeholder"
    }

    fn priority(&self) -> i32 {
        priority::TASK
    }

    fn register_tokens(&self) -> Vec<TokenSpec> {
        // double-quoted string with backslash escapes
        vec![TokenSpec::new(STRING_LITERAL, r#""(?:[^"\\]|\\.)*""#)]
    }

    fn register_parser_rules(&self) -> Vec<ParsingRule> {
        vec![ParsingRule {
            name: "parse_task_placeholder",
            priority: priority::TASK,
            func: parse_task_placeholder,
        }]
    }

    fn register_processors(&self) -> Vec<ProcessorRule> {
        vec![ProcessorRule {
            plugin: "task_placeholder",
            node_kind: NodeKind::Task,
            func: process_task,
        }]
    }

    fn initialize(&self, registry: &mut Registry) {
        let _ = registry.register_tokens_in_context(
            super::common_placeholders::PLACEHOLDER_CONTEXT,
            &[STRING_LITERAL],
        );
    }
}

fn parse_task_placeholder(
    context: &mut ParsingContext<'_>,
) -> Result<Option<TemplateNode>, TemplateError> {
    if !context.matches(PLACEHOLDER_START) {
        return Ok(None);
    }
    let saved = context.position;
    context.consume(PLACEHOLDER_START).map_err(TemplateError::from)?;
    context.skip_whitespace();

    if !context.matches(IDENTIFIER) || context.current().value != "task" {
        context.position = saved;
        return Ok(None);
    }
    context.advance();
    context.skip_whitespace();

    let mut default_prompt = None;
    if context.matches(COLON) {
        context.advance();
        context.skip_whitespace();

        let prompt_token = context.current().clone();
        if prompt_token.kind != IDENTIFIER || prompt_token.value != "prompt" {
            return Err(ParserError::at_token(
                "expected 'prompt' after ':' in task placeholder",
                &prompt_token,
            )
            .into());
        }
        context.advance();
        context.skip_whitespace();
        context.consume(COLON).map_err(TemplateError::from)?;
        context.skip_whitespace();

        if !context.matches(STRING_LITERAL) {
            return Err(ParserError::at_token(
                "expected string literal after 'prompt:' in task placeholder",
                context.current(),
            )
            .into());
        }
        let literal = context.advance();
        default_prompt = Some(parse_string_literal(&literal.value));
        context.skip_whitespace();
    }

    context.consume(PLACEHOLDER_END).map_err(TemplateError::from)?;
    Ok(Some(TemplateNode::Task(TaskNode { default_prompt })))
}

/// Strips the quotes and decodes `\n`, `\t`, `\r`, `\\`, `\"`; unknown
/// escapes stay verbatim.
fn parse_string_literal(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn process_task(
    processor: &mut Processor<'_>,
    processing_context: &ProcessingContext<'_>,
) -> Result<String, TemplateError> {
    let TemplateNode::Task(node) = processing_context.node() else {
        return Err(RenderError::new("expected task node").into());
    };

    let task_text = &processor.context_ref().run_ctx.options.task_text;
    if !task_text.trim().is_empty() {
        return Ok(task_text.clone());
    }
    Ok(node.default_prompt.clone().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::parse_string_literal;

    #[test]
    fn decodes_known_escapes() {
        assert_eq!(parse_string_literal(r#""a\nb\t\"c\"""#), "a\nb\t\"c\"");
    }

    #[test]
    fn keeps_unknown_escapes() {
        assert_eq!(parse_string_literal(r#""a\qb""#), r"a\qb");
    }
}
