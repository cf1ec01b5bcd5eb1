//! Parse rules for directives and comments.
//!
//! Directive parsing follows one template: collect the tokens between
//! `{%` and `%}`, dispatch on the first non-whitespace word, then let the
//! sub-parser consume the outer stream recursively until its closing
//! directive. Unbalanced directives fail naming the expected closer.

use crate::conditions::ConditionParser;

use super::super::nodes::{
    CommentNode, ConditionalNode, ElifBranch, ModeNode, TemplateNode,
};
use super::super::parser::ParsingContext;
use super::super::tokens::{Token, WHITESPACE};
use super::super::{ParserError, TemplateError};
use super::tokens::{COMMENT_END, COMMENT_START, DIRECTIVE_END, DIRECTIVE_START};

const IDENTIFIER: &str = super::super::common_placeholders::IDENTIFIER;

/// Rule for `{% ... %}` directives.
pub fn parse_directive(
    context: &mut ParsingContext<'_>,
) -> Result<Option<TemplateNode>, TemplateError> {
    if !context.matches(DIRECTIVE_START) {
        return Ok(None);
    }

    let content = collect_directive_content(context)?;
    let Some(first) = first_word(&content) else {
        return Err(ParserError::at_token("empty directive", context.current()).into());
    };

    match first.value.to_lowercase().as_str() {
        "if" => parse_if_directive(&content, context).map(Some),
        "mode" => parse_mode_directive(&content, context).map(Some),
        "elif" => Err(ParserError::at_token("elif without if", &first).into()),
        "else" => Err(ParserError::at_token("else without if", &first).into()),
        "endif" => Err(ParserError::at_token("endif without if", &first).into()),
        "endmode" => Err(ParserError::at_token("endmode without mode", &first).into()),
        other => {
            Err(ParserError::at_token(format!("unknown directive: {}", other), &first).into())
        }
    }
}

/// Rule for `{# ... #}` comments.
pub fn parse_comment(
    context: &mut ParsingContext<'_>,
) -> Result<Option<TemplateNode>, TemplateError> {
    if !context.matches(COMMENT_START) {
        return Ok(None);
    }
    context.consume(COMMENT_START).map_err(TemplateError::from)?;

    let mut text = String::new();
    while !context.is_at_end() && !context.matches(COMMENT_END) {
        text.push_str(&context.advance().value);
    }
    if context.is_at_end() {
        return Err(ParserError::at_token("expected #}", context.current()).into());
    }
    context.consume(COMMENT_END).map_err(TemplateError::from)?;

    Ok(Some(TemplateNode::Comment(CommentNode { text })))
}

/// Consumes `{% ... %}` and returns the interior tokens.
fn collect_directive_content(
    context: &mut ParsingContext<'_>,
) -> Result<Vec<Token>, TemplateError> {
    context.consume(DIRECTIVE_START).map_err(TemplateError::from)?;
    let mut content = Vec::new();
    while !context.is_at_end() && !context.matches(DIRECTIVE_END) {
        content.push(context.advance());
    }
    if context.is_at_end() {
        return Err(ParserError::at_token("expected %}", context.current()).into());
    }
    context.consume(DIRECTIVE_END).map_err(TemplateError::from)?;
    Ok(content)
}

fn first_word(content: &[Token]) -> Option<Token> {
    content
        .iter()
        .find(|token| token.kind != WHITESPACE)
        .cloned()
}

/// Condition text from its tokens, with canonical spacing: single spaces
/// between words, none around `:`, `(`, `)`.
fn reconstruct_condition_text(tokens: &[Token]) -> String {
    let words: Vec<&Token> = tokens.iter().filter(|t| t.kind != WHITESPACE).collect();
    let mut out = String::new();
    let tight = [":", "(", ")"];
    for (i, token) in words.iter().enumerate() {
        if i > 0 {
            let prev = words[i - 1];
            if !tight.contains(&token.value.as_str()) && !tight.contains(&prev.value.as_str()) {
                out.push(' ');
            }
        }
        out.push_str(&token.value);
    }
    out
}

/// Tokens after the directive keyword, with surrounding whitespace dropped.
fn tokens_after_keyword<'t>(content: &'t [Token], keyword: &str) -> Option<&'t [Token]> {
    let index = content
        .iter()
        .position(|t| t.kind == IDENTIFIER && t.value.to_lowercase() == keyword)?;
    let mut rest = &content[index + 1..];
    while let Some(first) = rest.first() {
        if first.kind == WHITESPACE {
            rest = &rest[1..];
        } else {
            break;
        }
    }
    let mut end = rest.len();
    while end > 0 && rest[end - 1].kind == WHITESPACE {
        end -= 1;
    }
    Some(&rest[..end])
}

fn parse_condition_from(
    content: &[Token],
    keyword: &str,
    context: &ParsingContext<'_>,
) -> Result<(String, crate::conditions::Condition), TemplateError> {
    let anchor = first_word(content).unwrap_or_else(|| context.current().clone());
    let condition_tokens = tokens_after_keyword(content, keyword)
        .filter(|tokens| !tokens.is_empty())
        .ok_or_else(|| {
            ParserError::at_token(format!("missing condition in {} directive", keyword), &anchor)
        })?;
    let condition_text = reconstruct_condition_text(condition_tokens);
    let condition = ConditionParser::parse(&condition_text)
        .map_err(|err| ParserError::from_condition(&err, &condition_tokens[0]))?;
    Ok((condition_text, condition))
}

fn parse_if_directive(
    content: &[Token],
    context: &mut ParsingContext<'_>,
) -> Result<TemplateNode, TemplateError> {
    let (condition_text, condition) = parse_condition_from(content, "if", context)?;
    let opening = first_word(content).unwrap_or_else(|| context.current().clone());

    let mut body = Vec::new();
    let mut elif_branches = Vec::new();
    let mut else_body = None;
    let mut found_end = false;

    while !context.is_at_end() {
        if check_directive_keyword(context, "endif") {
            consume_directive_keyword(context, "endif")?;
            found_end = true;
            break;
        }
        if check_directive_keyword(context, "elif") {
            elif_branches = parse_elif_branches(context)?;
            if check_directive_keyword(context, "else") {
                consume_directive_keyword(context, "else")?;
                else_body = Some(parse_else_body(context)?);
            }
            consume_directive_keyword(context, "endif")?;
            found_end = true;
            break;
        }
        if check_directive_keyword(context, "else") {
            consume_directive_keyword(context, "else")?;
            else_body = Some(parse_else_body(context)?);
            consume_directive_keyword(context, "endif")?;
            found_end = true;
            break;
        }
        if let Some(node) = context.parse_next_node()? {
            super::super::parser::push_coalescing(&mut body, node);
        }
    }

    if !found_end {
        return Err(ParserError::at_token("expected {% endif %}", &opening).into());
    }

    Ok(TemplateNode::Conditional(ConditionalNode {
        condition_text,
        condition,
        body,
        elif_branches,
        else_body,
    }))
}

fn parse_elif_branches(
    context: &mut ParsingContext<'_>,
) -> Result<Vec<ElifBranch>, TemplateError> {
    let mut branches = Vec::new();

    while check_directive_keyword(context, "elif") {
        let content = collect_directive_content(context)?;
        let (condition_text, condition) = parse_condition_from(&content, "elif", context)?;

        let mut body = Vec::new();
        while !context.is_at_end() {
            if check_directive_keyword(context, "elif")
                || check_directive_keyword(context, "else")
                || check_directive_keyword(context, "endif")
            {
                break;
            }
            if let Some(node) = context.parse_next_node()? {
                super::super::parser::push_coalescing(&mut body, node);
            }
        }

        branches.push(ElifBranch {
            condition_text,
            condition,
            body,
        });
    }

    Ok(branches)
}

fn parse_else_body(context: &mut ParsingContext<'_>) -> Result<Vec<TemplateNode>, TemplateError> {
    let mut body = Vec::new();
    while !context.is_at_end() && !check_directive_keyword(context, "endif") {
        if let Some(node) = context.parse_next_node()? {
            super::super::parser::push_coalescing(&mut body, node);
        }
    }
    Ok(body)
}

fn parse_mode_directive(
    content: &[Token],
    context: &mut ParsingContext<'_>,
) -> Result<TemplateNode, TemplateError> {
    let opening = first_word(content).unwrap_or_else(|| context.current().clone());
    let spec_tokens = tokens_after_keyword(content, "mode")
        .filter(|tokens| !tokens.is_empty())
        .ok_or_else(|| {
            ParserError::at_token("missing mode specification in mode directive", &opening)
        })?;

    let spec: String = spec_tokens
        .iter()
        .filter(|t| t.kind != WHITESPACE)
        .map(|t| t.value.as_str())
        .collect();

    let Some((modeset, mode)) = spec.split_once(':') else {
        return Err(ParserError::at_token(
            format!("invalid mode specification '{}', expected modeset:mode", spec),
            &opening,
        )
        .into());
    };
    let (modeset, mode) = (modeset.trim(), mode.trim());
    if modeset.is_empty() || mode.is_empty() {
        return Err(ParserError::at_token(
            format!("invalid mode specification '{}', expected modeset:mode", spec),
            &opening,
        )
        .into());
    }

    let mut body = Vec::new();
    let mut found_end = false;
    while !context.is_at_end() {
        if check_directive_keyword(context, "endmode") {
            consume_directive_keyword(context, "endmode")?;
            found_end = true;
            break;
        }
        if let Some(node) = context.parse_next_node()? {
            super::super::parser::push_coalescing(&mut body, node);
        }
    }
    if !found_end {
        return Err(ParserError::at_token("expected {% endmode %}", &opening).into());
    }

    Ok(TemplateNode::Mode(ModeNode {
        modeset: modeset.to_string(),
        mode: mode.to_string(),
        body,
    }))
}

/// Looks ahead (without consuming) for `{% keyword ... %}`.
fn check_directive_keyword(context: &ParsingContext<'_>, keyword: &str) -> bool {
    if !context.matches(DIRECTIVE_START) {
        return false;
    }
    let mut offset = 1;
    loop {
        let token = context.peek(offset);
        if token.is_eof() {
            return false;
        }
        if token.kind != WHITESPACE {
            return token.kind == IDENTIFIER && token.value.to_lowercase() == keyword;
        }
        offset += 1;
    }
}

/// Consumes a whole `{% keyword %}` directive.
fn consume_directive_keyword(
    context: &mut ParsingContext<'_>,
    keyword: &str,
) -> Result<(), TemplateError> {
    if !context.matches(DIRECTIVE_START) {
        return Err(ParserError::at_token(
            format!("expected {{% {} %}}", keyword),
            context.current(),
        )
        .into());
    }
    context.consume(DIRECTIVE_START).map_err(TemplateError::from)?;
    let mut found = false;
    while !context.is_at_end() && !context.matches(DIRECTIVE_END) {
        let token = context.advance();
        if token.value.to_lowercase() == keyword {
            found = true;
        }
    }
    if !found {
        return Err(
            ParserError::at_token(format!("expected '{}' directive", keyword), context.current())
                .into(),
        );
    }
    context.consume(DIRECTIVE_END).map_err(TemplateError::from)?;
    Ok(())
}
