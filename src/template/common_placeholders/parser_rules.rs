//! Parse rules for `${...}` section and include placeholders.
//!
//! Supported forms:
//!
//! ```text
//! ${section_name}
//! ${@origin:section_name}        ${@[origin]:section_name}
//! ${tpl:name}    ${ctx:name}
//! ${tpl@origin:name}             ${tpl@[origin]:name}
//! ```

use crate::run_context::SELF_ORIGIN;

use super::super::nodes::{IncludeKind, IncludeNode, SectionNode, TemplateNode};
use super::super::parser::ParsingContext;
use super::super::{ParserError, TemplateError};
use super::{AT, COLON, IDENTIFIER, LBRACKET, PLACEHOLDER_END, PLACEHOLDER_START, RBRACKET};

/// Entry rule. Declines (restoring the cursor) whenever the placeholder
/// body doesn't match this plugin's grammar, so lower-priority rules and
/// the TEXT fallback get their turn.
pub fn parse_placeholder(
    context: &mut ParsingContext<'_>,
) -> Result<Option<TemplateNode>, TemplateError> {
    if !context.matches(PLACEHOLDER_START) {
        return Ok(None);
    }
    let saved = context.position;

    let parsed = (|| -> Result<TemplateNode, ParserError> {
        context.consume(PLACEHOLDER_START)?;
        context.skip_whitespace();
        let node = parse_placeholder_content(context)?;
        context.skip_whitespace();
        context.consume(PLACEHOLDER_END)?;
        Ok(node)
    })();

    match parsed {
        Ok(node) => Ok(Some(node)),
        Err(_) => {
            context.position = saved;
            Ok(None)
        }
    }
}

fn parse_placeholder_content(
    context: &mut ParsingContext<'_>,
) -> Result<TemplateNode, ParserError> {
    if check_include_prefix(context) {
        return parse_include(context).map(TemplateNode::Include);
    }
    if context.matches(AT) {
        return parse_addressed_section(context).map(TemplateNode::Section);
    }
    let name = parse_identifier_path(context)?;
    Ok(TemplateNode::Section(SectionNode {
        section_name: name,
        resolved_ref: None,
    }))
}

/// `tpl`/`ctx` followed by `:` or `@` starts an include.
fn check_include_prefix(context: &ParsingContext<'_>) -> bool {
    let current = context.current();
    if current.kind != IDENTIFIER {
        return false;
    }
    if current.value != "tpl" && current.value != "ctx" {
        return false;
    }
    matches!(context.peek(1).kind, k if k == COLON || k == AT)
}

fn parse_include(context: &mut ParsingContext<'_>) -> Result<IncludeNode, ParserError> {
    let kind_token = context.consume(IDENTIFIER)?;
    let kind = match kind_token.value.as_str() {
        "tpl" => IncludeKind::Tpl,
        "ctx" => IncludeKind::Ctx,
        other => {
            return Err(ParserError::at_token(
                format!("expected 'tpl' or 'ctx', got '{}'", other),
                &kind_token,
            ))
        }
    };

    if context.matches(AT) {
        context.advance();
        let (origin, name) = parse_addressed_reference(context)?;
        return Ok(IncludeNode {
            kind,
            name,
            origin,
            children: None,
            frontmatter: None,
        });
    }

    context.consume(COLON)?;
    let name = parse_identifier_path(context)?;
    Ok(IncludeNode {
        kind,
        name,
        origin: SELF_ORIGIN.to_string(),
        children: None,
        frontmatter: None,
    })
}

/// `@origin:name` keeps its addressed spelling on the node; the resolver
/// splits it against the current origin.
fn parse_addressed_section(context: &mut ParsingContext<'_>) -> Result<SectionNode, ParserError> {
    context.consume(AT)?;
    let (origin, name) = parse_addressed_reference(context)?;
    Ok(SectionNode {
        section_name: format!("@{}:{}", origin, name),
        resolved_ref: None,
    })
}

/// `origin:name` or `[origin]:name` (brackets admit `:` inside the origin).
fn parse_addressed_reference(
    context: &mut ParsingContext<'_>,
) -> Result<(String, String), ParserError> {
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
            ));
        }
        context.consume(RBRACKET)?;
        context.consume(COLON)?;
        let name = parse_identifier_path(context)?;
        if origin.is_empty() {
            return Err(ParserError::at_token("empty origin", context.current()));
        }
        return Ok((origin, name));
    }

    let origin = parse_identifier_path(context)?;
    context.consume(COLON)?;
    let name = parse_identifier_path(context)?;
    Ok((origin, name))
}

fn parse_identifier_path(context: &mut ParsingContext<'_>) -> Result<String, ParserError> {
    let token = context.consume(IDENTIFIER).map_err(|_| {
        ParserError::at_token("expected identifier", context.current())
    })?;
    Ok(token.value)
}
