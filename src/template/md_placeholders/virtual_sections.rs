//! Virtual section factory for Markdown-file placeholders.

use std::path::Path;

use regex::Regex;
use std::sync::OnceLock;

use crate::markdown::model::{
    MarkdownCfg, MarkdownKeepCfg, MatchKind, SectionMatch, SectionRule,
};
use crate::markdown::slugify_github;
use crate::run_context::SELF_ORIGIN;
use crate::sections::{FilterNode, SectionCfg, SectionRef};

use super::super::common::{merge_origins, scope_dir_for_origin};
use super::super::nodes::MarkdownFileNode;
use super::super::RenderError;
use super::heading_context::HeadingContext;

/// Materializes the one-shot section configuration for a Markdown-file
/// node: an `.md` extension filter, an allow filter naming the concrete
/// path, and a Markdown adapter config derived from the heading context
/// (explicit node parameters win).
pub fn create_for_markdown_file(
    node: &MarkdownFileNode,
    repo_root: &Path,
    current_origin: &str,
    heading_context: &HeadingContext,
    section_name: String,
) -> Result<(SectionCfg, SectionRef), RenderError> {
    let normalized_path = normalize_file_path(&node.path, node.origin.as_deref(), node.is_glob);
    let filters = FilterNode::allow_only(vec![normalized_path]);
    let markdown = markdown_config(node, heading_context);

    let section_cfg = SectionCfg {
        extensions: vec![".md".to_string(), ".markdown".to_string()],
        filters,
        markdown,
    };

    let effective_origin = merge_origins(current_origin, node.origin.as_deref());
    let scope_dir = scope_dir_for_origin(repo_root, &effective_origin)
        .map_err(|err| RenderError::new(err.message))?;
    let scope_rel = if effective_origin == SELF_ORIGIN {
        String::new()
    } else {
        effective_origin
    };

    let section_ref = SectionRef {
        name: section_name,
        scope_rel,
        scope_dir,
    };

    Ok((section_cfg, section_ref))
}

/// Path normalization: `@origin` paths always live under that scope's
/// `lg-cfg/`; plain paths are repository-root relative. Non-glob paths
/// get `.md` appended when no markdown extension is present.
fn normalize_file_path(path: &str, origin: Option<&str>, is_glob: bool) -> String {
    let mut normalized = path.trim().to_string();

    if !is_glob && !normalized.ends_with(".md") && !normalized.ends_with(".markdown") {
        normalized.push_str(".md");
    }

    if origin.is_some() {
        if let Some(absolute) = normalized.strip_prefix('/') {
            format!("/lg-cfg/{}", absolute)
        } else {
            format!("/lg-cfg/{}", normalized)
        }
    } else if normalized.starts_with('/') {
        normalized
    } else {
        format!("/{}", normalized)
    }
}

fn markdown_config(node: &MarkdownFileNode, heading_context: &HeadingContext) -> MarkdownCfg {
    let max_heading_level = node.heading_level.unwrap_or(heading_context.heading_level);
    let strip_h1 = node.strip_h1.unwrap_or(heading_context.strip_h1);

    let mut config = MarkdownCfg {
        max_heading_level: Some(max_heading_level),
        strip_h1,
        placeholder_inside_heading: heading_context.inside_heading,
        ..MarkdownCfg::default()
    };

    if let Some(anchor) = &node.anchor {
        let slug = slugify_github(&normalize_anchor(anchor));
        config.keep = Some(MarkdownKeepCfg {
            sections: vec![SectionRule {
                matcher: Some(SectionMatch {
                    kind: MatchKind::Slug,
                    pattern: slug,
                    flags: None,
                }),
                reason: Some(format!("md placeholder anchor: #{}", anchor)),
                ..SectionRule::default()
            }],
            frontmatter: false,
        });
    }

    config
}

/// Re-spaces an anchor so its slug matches the real heading slug:
/// `FAQ:Common` becomes `FAQ: Common`, `API&Usage` becomes `API & Usage`.
fn normalize_anchor(anchor: &str) -> String {
    fn colon_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r":(\S)").unwrap())
    }
    fn amp_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"&(\S)").unwrap())
    }

    let spaced = colon_re().replace_all(anchor, ": $1");
    let spaced = amp_re().replace_all(&spaced, " & $1");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_anchor_at_repo_root() {
        assert_eq!(normalize_file_path("docs/guide", None, false), "/docs/guide.md");
        assert_eq!(normalize_file_path("README.md", None, false), "/README.md");
    }

    #[test]
    fn addressed_paths_live_under_lg_cfg() {
        assert_eq!(
            normalize_file_path("notes", Some("apps/web"), false),
            "/lg-cfg/notes.md"
        );
        assert_eq!(
            normalize_file_path("/notes.md", Some("apps/web"), false),
            "/lg-cfg/notes.md"
        );
    }

    #[test]
    fn globs_keep_their_spelling() {
        assert_eq!(normalize_file_path("docs/*", None, true), "/docs/*");
    }

    #[test]
    fn anchors_are_normalized_for_slugs() {
        assert_eq!(normalize_anchor("FAQ:Common Questions"), "FAQ: Common Questions");
        assert_eq!(normalize_anchor("API&Usage"), "API & Usage");
        assert_eq!(normalize_anchor("  a   b "), "a b");
    }
}
