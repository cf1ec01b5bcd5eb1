//! Processors for conditionals, mode blocks, and comments.

use super::super::nodes::TemplateNode;
use super::super::processor::{ProcessingContext, Processor};
use super::super::{RenderError, TemplateError};

/// Evaluates the primary condition, then the `elif` branches in source
/// order, then falls back to `else`. Once a branch is taken no further
/// condition is evaluated.
pub fn process_conditional(
    processor: &mut Processor<'_>,
    processing_context: &ProcessingContext<'_>,
) -> Result<String, TemplateError> {
    let TemplateNode::Conditional(node) = processing_context.node() else {
        return Err(RenderError::new("expected conditional node").into());
    };

    if processor.context_ref().evaluate_condition(&node.condition) {
        return processor.process_nodes(&node.body);
    }

    for branch in &node.elif_branches {
        if processor.context_ref().evaluate_condition(&branch.condition) {
            return processor.process_nodes(&branch.body);
        }
    }

    match &node.else_body {
        Some(body) => processor.process_nodes(body),
        None => Ok(String::new()),
    }
}

/// Enters the mode, renders the body, and always exits, errors included.
pub fn process_mode_block(
    processor: &mut Processor<'_>,
    processing_context: &ProcessingContext<'_>,
) -> Result<String, TemplateError> {
    let TemplateNode::Mode(node) = processing_context.node() else {
        return Err(RenderError::new("expected mode node").into());
    };

    processor
        .context()
        .enter_mode_block(&node.modeset, &node.mode)
        .map_err(TemplateError::Render)?;

    let result = processor.process_nodes(&node.body);
    let exited = processor.context().exit_mode_block();

    let body = result?;
    exited.map_err(TemplateError::Render)?;
    Ok(body)
}

/// Comments never reach the output.
pub fn process_comment(
    _processor: &mut Processor<'_>,
    processing_context: &ProcessingContext<'_>,
) -> Result<String, TemplateError> {
    match processing_context.node() {
        TemplateNode::Comment(_) => Ok(String::new()),
        _ => Err(RenderError::new("expected comment node").into()),
    }
}
