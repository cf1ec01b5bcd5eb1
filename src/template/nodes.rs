//! Template AST.
//!
//! Nodes are immutable values: the resolver and the processor build new
//! nodes instead of mutating. The `children` slot of an include is `None`
//! until the resolver has processed the node.

use serde::Serialize;

use crate::conditions::Condition;
use crate::run_context::SELF_ORIGIN;
use crate::sections::SectionRef;

use super::frontmatter::ContextFrontmatter;

/// Discriminant used for registry dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum NodeKind {
    Text,
    Section,
    Include,
    Conditional,
    Mode,
    Comment,
    MarkdownFile,
    Task,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Text => "text",
            NodeKind::Section => "section",
            NodeKind::Include => "include",
            NodeKind::Conditional => "conditional",
            NodeKind::Mode => "mode",
            NodeKind::Comment => "comment",
            NodeKind::MarkdownFile => "markdown_file",
            NodeKind::Task => "task",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeKind {
    Tpl,
    Ctx,
}

impl IncludeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IncludeKind::Tpl => "tpl",
            IncludeKind::Ctx => "ctx",
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            IncludeKind::Tpl => ".tpl.md",
            IncludeKind::Ctx => ".ctx.md",
        }
    }
}

/// Byte-faithful literal fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextNode {
    pub text: String,
}

/// `${name}` / `${@origin:name}` section placeholder. `resolved_ref` is
/// filled by the resolver; the processor never sees it unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionNode {
    pub section_name: String,
    pub resolved_ref: Option<SectionRef>,
}

/// `${tpl:name}` / `${ctx:name}` inclusion of another template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncludeNode {
    pub kind: IncludeKind,
    pub name: String,
    /// `"self"` or the scope path the include addresses.
    pub origin: String,
    /// Resolved sub-AST; populated iff the resolver processed this node.
    pub children: Option<Vec<TemplateNode>>,
    /// Frontmatter of the included file, if any.
    pub frontmatter: Option<ContextFrontmatter>,
}

impl IncludeNode {
    /// Canonical key used for cycle detection and memoization:
    /// `{kind}[@{origin}]:{name}`.
    pub fn canon_key(&self) -> String {
        if self.origin == SELF_ORIGIN {
            format!("{}:{}", self.kind.as_str(), self.name)
        } else {
            format!("{}@{}:{}", self.kind.as_str(), self.origin, self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElifBranch {
    pub condition_text: String,
    pub condition: Condition,
    pub body: Vec<TemplateNode>,
}

/// `{% if %}...{% elif %}...{% else %}...{% endif %}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalNode {
    pub condition_text: String,
    pub condition: Condition,
    pub body: Vec<TemplateNode>,
    pub elif_branches: Vec<ElifBranch>,
    pub else_body: Option<Vec<TemplateNode>>,
}

/// `{% mode modeset:mode %}...{% endmode %}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeNode {
    pub modeset: String,
    pub mode: String,
    pub body: Vec<TemplateNode>,
}

/// `{# ... #}`; discarded at render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    pub text: String,
}

/// `${md:path}` with its optional anchor, parameters, and guard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkdownFileNode {
    pub path: String,
    pub origin: Option<String>,
    pub heading_level: Option<u8>,
    pub strip_h1: Option<bool>,
    pub anchor: Option<String>,
    /// Guard condition source text (`if:` parameter).
    pub condition: Option<String>,
    pub is_glob: bool,
}

impl MarkdownFileNode {
    pub fn canon_key(&self) -> String {
        match &self.origin {
            Some(origin) => format!("md@{}:{}", origin, self.path),
            None => format!("md:{}", self.path),
        }
    }
}

/// `${task}` / `${task:prompt:"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskNode {
    pub default_prompt: Option<String>,
}

/// One node of a template AST.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TemplateNode {
    Text(TextNode),
    Section(SectionNode),
    Include(IncludeNode),
    Conditional(ConditionalNode),
    Mode(ModeNode),
    Comment(CommentNode),
    MarkdownFile(MarkdownFileNode),
    Task(TaskNode),
}

impl TemplateNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            TemplateNode::Text(_) => NodeKind::Text,
            TemplateNode::Section(_) => NodeKind::Section,
            TemplateNode::Include(_) => NodeKind::Include,
            TemplateNode::Conditional(_) => NodeKind::Conditional,
            TemplateNode::Mode(_) => NodeKind::Mode,
            TemplateNode::Comment(_) => NodeKind::Comment,
            TemplateNode::MarkdownFile(_) => NodeKind::MarkdownFile,
            TemplateNode::Task(_) => NodeKind::Task,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        TemplateNode::Text(TextNode { text: text.into() })
    }
}

/// A parsed template: the ordered list of its top-level nodes.
pub type TemplateAst = Vec<TemplateNode>;

/// All section nodes of an AST, depth-first.
pub fn collect_section_nodes(ast: &[TemplateNode]) -> Vec<&SectionNode> {
    let mut out = Vec::new();
    walk(ast, &mut |node| {
        if let TemplateNode::Section(section) = node {
            out.push(section);
        }
    });
    out
}

/// All include nodes of an AST, depth-first.
pub fn collect_include_nodes(ast: &[TemplateNode]) -> Vec<&IncludeNode> {
    let mut out = Vec::new();
    walk(ast, &mut |node| {
        if let TemplateNode::Include(include) = node {
            out.push(include);
        }
    });
    out
}

fn walk<'a>(ast: &'a [TemplateNode], visit: &mut impl FnMut(&'a TemplateNode)) {
    for node in ast {
        visit(node);
        match node {
            TemplateNode::Include(include) => {
                if let Some(children) = &include.children {
                    walk(children, visit);
                }
            }
            TemplateNode::Conditional(conditional) => {
                walk(&conditional.body, visit);
                for branch in &conditional.elif_branches {
                    walk(&branch.body, visit);
                }
                if let Some(else_body) = &conditional.else_body {
                    walk(else_body, visit);
                }
            }
            TemplateNode::Mode(mode) => walk(&mode.body, visit),
            _ => {}
        }
    }
}
