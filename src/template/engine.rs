//! Engine assembly: registry construction, plugin wiring, and the public
//! render entry points.

use crate::run_context::{RunContext, SELF_ORIGIN};
use crate::sections::{MarkdownSectionService, SectionRef};

use super::adaptive::AdaptivePlugin;
use super::common::{cfg_root_for_origin, load_from_cfg};
use super::common_placeholders::CommonPlaceholdersPlugin;
use super::context::TemplateContext;
use super::frontmatter::parse_frontmatter;
use super::md_placeholders::MdPlaceholdersPlugin;
use super::nodes::{
    collect_include_nodes, collect_section_nodes, IncludeKind, TemplateAst, TemplateNode,
};
use super::parser::parse_template;
use super::processor::{Processor, SectionHandler};
use super::registry::Registry;
use super::resolver::Resolver;
use super::task_placeholder::TaskPlaceholderPlugin;
use super::{RenderError, TemplateError};

/// The assembled template engine.
///
/// Owns the plugin registry and the run context; each render builds a
/// fresh rendering state, so one engine can render any number of
/// templates.
pub struct TemplateEngine<'h> {
    registry: Registry,
    run_ctx: RunContext,
    section_handler: Option<Box<SectionHandler<'h>>>,
}

impl<'h> TemplateEngine<'h> {
    /// Builds the engine with the core plugin set: common placeholders,
    /// adaptive directives, Markdown-file placeholders, and the task
    /// placeholder.
    pub fn new(run_ctx: RunContext) -> Result<Self, TemplateError> {
        let mut registry = Registry::new();

        let common = CommonPlaceholdersPlugin;
        let adaptive = AdaptivePlugin;
        let markdown = MdPlaceholdersPlugin;
        let task = TaskPlaceholderPlugin;

        registry.register_plugin(&common)?;
        registry.register_plugin(&adaptive)?;
        registry.register_plugin(&markdown)?;
        registry.register_plugin(&task)?;
        registry.initialize_plugins(&[
            &common as &dyn super::registry::TemplatePlugin,
            &adaptive,
            &markdown,
            &task,
        ]);

        Ok(Self {
            registry,
            run_ctx,
            section_handler: None,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn run_ctx(&self) -> &RunContext {
        &self.run_ctx
    }

    /// Installs the host's section renderer. Without one, virtual
    /// (Markdown-placeholder) sections fall back to the built-in
    /// file-based service and ordinary sections fail to render.
    pub fn set_section_handler<F>(&mut self, handler: F)
    where
        F: Fn(&SectionRef, &TemplateContext) -> Result<String, RenderError> + 'h,
    {
        self.section_handler = Some(Box::new(handler));
    }

    /// Lexes and parses template text.
    pub fn parse(&self, text: &str) -> Result<TemplateAst, TemplateError> {
        parse_template(text, &self.registry)
    }

    /// Resolves a parsed AST.
    pub fn resolve(&self, ast: &[TemplateNode]) -> Result<TemplateAst, TemplateError> {
        let mut resolver = Resolver::new(&self.registry, self.run_ctx.root.clone());
        resolver.resolve_template(ast)
    }

    /// Renders an already resolved AST.
    pub fn render_resolved(&self, ast: &[TemplateNode]) -> Result<String, TemplateError> {
        let mut context = TemplateContext::new(self.run_ctx.clone());
        let handler: &SectionHandler<'_> = match &self.section_handler {
            Some(handler) => handler.as_ref(),
            None => &default_section_handler,
        };
        let mut processor = Processor::new(&self.registry, &mut context, handler);
        processor.process(ast)
    }

    /// Full pipeline for template text: parse, resolve, render.
    pub fn render_text(&self, text: &str) -> Result<String, TemplateError> {
        let ast = self.parse(text)?;
        let resolved = self.resolve(&ast)?;
        self.render_resolved(&resolved)
    }

    /// Renders `lg-cfg/<name>.ctx.md`, stripping frontmatter first.
    pub fn render_context(&self, name: &str) -> Result<String, TemplateError> {
        self.render_file(name, IncludeKind::Ctx)
    }

    /// Renders `lg-cfg/<name>.tpl.md`, stripping frontmatter first.
    pub fn render_template_file(&self, name: &str) -> Result<String, TemplateError> {
        self.render_file(name, IncludeKind::Tpl)
    }

    /// Section names and canonical include keys a template refers to,
    /// gathered without resolving or rendering anything.
    pub fn template_dependencies(
        &self,
        text: &str,
    ) -> Result<TemplateDependencies, TemplateError> {
        let ast = self.parse(text)?;
        Ok(TemplateDependencies {
            sections: collect_section_nodes(&ast)
                .iter()
                .map(|section| section.section_name.clone())
                .collect(),
            includes: collect_include_nodes(&ast)
                .iter()
                .map(|include| include.canon_key())
                .collect(),
        })
    }

    fn render_file(&self, name: &str, kind: IncludeKind) -> Result<String, TemplateError> {
        let cfg_root = cfg_root_for_origin(&self.run_ctx.root, SELF_ORIGIN)?;
        let (_path, raw) = load_from_cfg(&cfg_root, name, kind.suffix())?;
        let (_frontmatter, body) = parse_frontmatter(&raw);
        self.render_text(body)
    }
}

/// Dependency summary of a parsed template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateDependencies {
    pub sections: Vec<String>,
    /// Canonical include keys (`kind[@origin]:name`).
    pub includes: Vec<String>,
}

/// Fallback section handler: virtual sections render through the built-in
/// Markdown section service; anything else needs a host handler.
fn default_section_handler(
    section_ref: &SectionRef,
    context: &TemplateContext,
) -> Result<String, RenderError> {
    match context.virtual_section() {
        Some(cfg) => MarkdownSectionService::new(None)
            .render(section_ref, cfg)
            .map_err(RenderError::new),
        None => Err(RenderError::new(format!(
            "no section handler installed for section '{}'",
            section_ref.name
        ))),
    }
}
