//! Render pass.
//!
//! A single depth-first, left-to-right walk over the resolved AST. Each
//! node is rendered by the winning registered processor for its kind;
//! recursion and section rendering go back through the [`Processor`] so
//! plugins never depend on each other directly.

use crate::sections::SectionRef;

use super::context::TemplateContext;
use super::nodes::TemplateNode;
use super::registry::Registry;
use super::{RenderError, TemplateError};

/// A node's position within its sibling list; Markdown placeholders use
/// the surrounding nodes for heading-context analysis.
pub struct ProcessingContext<'a> {
    pub ast: &'a [TemplateNode],
    pub index: usize,
}

impl<'a> ProcessingContext<'a> {
    pub fn node(&self) -> &'a TemplateNode {
        &self.ast[self.index]
    }
}

/// Host-supplied section renderer.
pub type SectionHandler<'h> =
    dyn Fn(&SectionRef, &TemplateContext) -> Result<String, RenderError> + 'h;

pub struct Processor<'a> {
    registry: &'a Registry,
    context: &'a mut TemplateContext,
    section_handler: &'a SectionHandler<'a>,
}

impl<'a> Processor<'a> {
    pub fn new(
        registry: &'a Registry,
        context: &'a mut TemplateContext,
        section_handler: &'a SectionHandler<'a>,
    ) -> Self {
        Self {
            registry,
            context,
            section_handler,
        }
    }

    pub fn context(&mut self) -> &mut TemplateContext {
        self.context
    }

    pub fn context_ref(&self) -> &TemplateContext {
        self.context
    }

    /// Renders a whole resolved AST and checks stack balance afterwards.
    pub fn process(&mut self, ast: &[TemplateNode]) -> Result<String, TemplateError> {
        let depth_before = self.context.stack_depth();
        let result = self.process_nodes(ast);
        if result.is_ok() {
            self.context.check_balanced();
        }
        debug_assert_eq!(
            self.context.stack_depth(),
            depth_before,
            "mode/origin stack out of balance after render"
        );
        result
    }

    /// Renders a node list in order; recursion entry point for plugins.
    pub fn process_nodes(&mut self, ast: &[TemplateNode]) -> Result<String, TemplateError> {
        let mut out = String::new();
        for index in 0..ast.len() {
            let rendered = self.process_node(&ProcessingContext { ast, index })?;
            out.push_str(&rendered);
        }
        Ok(out)
    }

    /// Renders a single node through its registered processor.
    pub fn process_node(
        &mut self,
        processing_context: &ProcessingContext<'_>,
    ) -> Result<String, TemplateError> {
        let kind = processing_context.node().kind();
        let Some((func, plugin)) = self
            .registry
            .processor_for(kind)
            .map(|rule| (rule.func, rule.plugin))
        else {
            return Err(RenderError::for_node(
                "no processor registered for node",
                kind,
                "core",
            )
            .into());
        };

        func(self, processing_context).map_err(|err| match err {
            TemplateError::Render(mut render) => {
                if render.node_kind.is_none() {
                    render.node_kind = Some(kind);
                }
                if render.plugin.is_none() {
                    render.plugin = Some(plugin);
                }
                TemplateError::Render(render)
            }
            other => other,
        })
    }

    /// Renders a resolved section reference through the host handler.
    pub fn process_section_ref(&mut self, section_ref: &SectionRef) -> Result<String, TemplateError> {
        (self.section_handler)(section_ref, &*self.context).map_err(TemplateError::Render)
    }
}
