//! Parse rules for `${md:...}` placeholders.

use super::super::nodes::{MarkdownFileNode, TemplateNode};
use super::super::parser::ParsingContext;
use super::super::tokens::{Token, WHITESPACE};
use super::super::{ParserError, TemplateError};
use super::tokens::{BOOL_FALSE, BOOL_TRUE, COMMA, GLOB_STAR, HASH, NUMBER};

const PLACEHOLDER_START: &str = super::super::common_placeholders::PLACEHOLDER_START;
const PLACEHOLDER_END: &str = super::super::common_placeholders::PLACEHOLDER_END;
const IDENTIFIER: &str = super::super::common_placeholders::IDENTIFIER;
const COLON: &str = super::super::common_placeholders::COLON;
const AT: &str = super::super::common_placeholders::AT;
const LBRACKET: &str = super::super::common_placeholders::LBRACKET;
const RBRACKET: &str = super::super::common_placeholders::RBRACKET;

/// Entry rule. Declines until the `md` prefix is confirmed; after that any
/// malformed input is a hard parse error.
pub fn parse_md_placeholder(
    context: &mut ParsingContext<'_>,
) -> Result<Option<TemplateNode>, TemplateError> {
    if !context.matches(PLACEHOLDER_START) {
        return Ok(None);
    }
    let saved = context.position;
    context.consume(PLACEHOLDER_START).map_err(TemplateError::from)?;
    context.skip_whitespace();

    if !context.matches(IDENTIFIER) || context.current().value != "md" {
        context.position = saved;
        return Ok(None);
    }
    context.advance();

    let node = parse_md_content(context)?;
    context.consume(PLACEHOLDER_END).map_err(TemplateError::from)?;
    Ok(Some(TemplateNode::MarkdownFile(node)))
}

fn parse_md_content(context: &mut ParsingContext<'_>) -> Result<MarkdownFileNode, TemplateError> {
    if context.matches(AT) {
        context.advance();
        let origin = parse_origin(context)?;
        context.consume(COLON).map_err(TemplateError::from)?;
        build_node(context, Some(origin))
    } else if context.matches(COLON) {
        context.advance();
        build_node(context, None)
    } else {
        Err(ParserError::at_token("expected ':' or '@' after 'md'", context.current()).into())
    }
}

fn build_node(
    context: &mut ParsingContext<'_>,
    origin: Option<String>,
) -> Result<MarkdownFileNode, TemplateError> {
    let path = parse_file_path(context)?;

    let anchor = if context.matches(HASH) {
        context.advance();
        Some(parse_anchor(context)?)
    } else {
        None
    };

    let mut node = MarkdownFileNode {
        is_glob: path.contains('*'),
        path,
        origin,
        heading_level: None,
        strip_h1: None,
        anchor,
        condition: None,
    };

    while context.matches(COMMA) {
        context.advance();
        apply_parameter(context, &mut node)?;
    }

    Ok(node)
}

/// Origin of an addressed reference: `origin` or `[origin]` (brackets
/// admit `:` inside).
fn parse_origin(context: &mut ParsingContext<'_>) -> Result<String, TemplateError> {
    if context.matches(LBRACKET) {
        context.advance();
        let mut origin = String::new();
        while !context.matches(RBRACKET) && !context.is_at_end() {
            origin.push_str(&context.advance().value);
        }
        if context.is_at_end() {
            return Err(ParserError::at_token(
                "expected ']' to close bracketed origin",
                context.current(),
            )
            .into());
        }
        context.consume(RBRACKET).map_err(TemplateError::from)?;
        return Ok(origin);
    }

    let mut origin = String::new();
    while !context.matches(COLON) && !context.is_at_end() {
        if context.matches_any(&[PLACEHOLDER_END, COMMA, HASH]) {
            break;
        }
        origin.push_str(&context.advance().value);
    }
    if origin.is_empty() {
        return Err(
            ParserError::at_token("empty origin in md reference", context.current()).into(),
        );
    }
    Ok(origin)
}

fn parse_file_path(context: &mut ParsingContext<'_>) -> Result<String, TemplateError> {
    let mut path = String::new();
    loop {
        let current = context.current();
        if context.matches_any(&[HASH, COMMA, PLACEHOLDER_END]) || current.is_eof() {
            break;
        }
        if context.matches_any(&[IDENTIFIER, GLOB_STAR, NUMBER, BOOL_TRUE, BOOL_FALSE]) {
            path.push_str(&context.advance().value);
        } else {
            break;
        }
    }
    if path.is_empty() {
        return Err(ParserError::at_token("expected file path", context.current()).into());
    }
    Ok(path)
}

fn parse_anchor(context: &mut ParsingContext<'_>) -> Result<String, TemplateError> {
    let mut anchor = String::new();
    while !context.matches_any(&[COMMA, PLACEHOLDER_END]) && !context.is_at_end() {
        anchor.push_str(&context.advance().value);
    }
    let anchor = anchor.trim().to_string();
    if anchor.is_empty() {
        return Err(
            ParserError::at_token("expected anchor name after '#'", context.current()).into(),
        );
    }
    Ok(anchor)
}

/// One `key:value` parameter. Unknown keys are hard errors naming the
/// supported set.
fn apply_parameter(
    context: &mut ParsingContext<'_>,
    node: &mut MarkdownFileNode,
) -> Result<(), TemplateError> {
    context.skip_whitespace();

    if !context.matches(IDENTIFIER) {
        return Err(ParserError::at_token("expected parameter name", context.current()).into());
    }
    let name_token = context.advance();
    context.consume(COLON).map_err(TemplateError::from)?;
    context.skip_whitespace();

    match name_token.value.as_str() {
        "level" => {
            node.heading_level = Some(parse_level_value(context, &name_token)?);
        }
        "strip_h1" => {
            node.strip_h1 = Some(parse_bool_value(context)?);
        }
        "anchor" => {
            let value = parse_string_value(context)?;
            if value.trim().is_empty() {
                return Err(ParserError::at_token("anchor cannot be empty", &name_token).into());
            }
            node.anchor = Some(value.trim().to_string());
        }
        "if" => {
            node.condition = Some(parse_condition_value(context)?);
        }
        other => {
            return Err(ParserError::at_token(
                format!(
                    "unknown parameter '{}', supported parameters: level, strip_h1, if, anchor",
                    other
                ),
                &name_token,
            )
            .into());
        }
    }
    Ok(())
}

fn parse_level_value(
    context: &mut ParsingContext<'_>,
    name_token: &Token,
) -> Result<u8, TemplateError> {
    let token = context.current().clone();
    if !context.matches_any(&[NUMBER, IDENTIFIER]) {
        return Err(ParserError::at_token("expected number value", &token).into());
    }
    context.advance();
    let value: u8 = token
        .value
        .parse()
        .map_err(|_| ParserError::at_token(format!("invalid number: {}", token.value), &token))?;
    if !(1..=6).contains(&value) {
        return Err(ParserError::at_token(
            format!("level must be between 1 and 6, got {}", value),
            name_token,
        )
        .into());
    }
    Ok(value)
}

fn parse_bool_value(context: &mut ParsingContext<'_>) -> Result<bool, TemplateError> {
    let token = context.current().clone();
    let accepted = if token.kind == BOOL_TRUE {
        Some(true)
    } else if token.kind == BOOL_FALSE {
        Some(false)
    } else {
        match token.value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    };
    match accepted {
        Some(value) => {
            context.advance();
            Ok(value)
        }
        None => {
            Err(ParserError::at_token("expected boolean value (true/false/1/0/yes/no)", &token)
                .into())
        }
    }
}

fn parse_string_value(context: &mut ParsingContext<'_>) -> Result<String, TemplateError> {
    let mut value = String::new();
    while !context.matches_any(&[COMMA, PLACEHOLDER_END]) && !context.is_at_end() {
        value.push_str(&context.advance().value);
    }
    if value.is_empty() {
        return Err(ParserError::at_token("expected parameter value", context.current()).into());
    }
    Ok(value)
}

/// Condition text up to the next `,` or `}`, re-spaced so the condition
/// parser sees canonical input.
fn parse_condition_value(context: &mut ParsingContext<'_>) -> Result<String, TemplateError> {
    let mut parts: Vec<String> = Vec::new();
    let tight = [":", "(", ")"];
    while !context.matches_any(&[COMMA, PLACEHOLDER_END]) && !context.is_at_end() {
        let token = context.advance();
        if token.kind == WHITESPACE {
            continue;
        }
        if let Some(last) = parts.last() {
            if !tight.contains(&token.value.as_str()) && !tight.contains(&last.as_str()) {
                parts.push(" ".to_string());
            }
        }
        parts.push(token.value);
    }
    if parts.is_empty() {
        return Err(
            ParserError::at_token("expected condition value after 'if:'", context.current()).into(),
        );
    }
    Ok(parts.concat())
}
