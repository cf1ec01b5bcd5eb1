//! Resolver rules for section and include placeholders.

use crate::run_context::SELF_ORIGIN;
use crate::sections::SectionRef;

use super::super::common::{merge_origins, scope_dir_for_origin, split_section_address};
use super::super::nodes::{IncludeNode, SectionNode, TemplateNode};
use super::super::resolver::Resolver;
use super::super::{ResolverError, TemplateError};

/// Resolves a section reference against the current file's origin.
pub fn resolve_section(
    resolver: &mut Resolver<'_>,
    node: &TemplateNode,
) -> Result<TemplateNode, TemplateError> {
    let TemplateNode::Section(section) = node else {
        return Ok(node.clone());
    };

    let (address_origin, bare_name) = split_section_address(&section.section_name)?;
    let effective_origin = merge_origins(resolver.current_origin(), address_origin);
    let scope_dir = scope_dir_for_origin(resolver.repo_root(), &effective_origin).map_err(
        |err| {
            ResolverError::new(
                format!(
                    "failed to resolve section '{}': {}",
                    section.section_name, err.message
                ),
                section.section_name.clone(),
            )
        },
    )?;
    let scope_rel = if effective_origin == SELF_ORIGIN {
        String::new()
    } else {
        effective_origin.clone()
    };

    Ok(TemplateNode::Section(SectionNode {
        section_name: bare_name.to_string(),
        resolved_ref: Some(SectionRef {
            name: bare_name.to_string(),
            scope_rel,
            scope_dir,
        }),
    }))
}

/// Resolves an include: computes its effective origin, loads and parses
/// the target, recursively resolves it, and attaches the child AST.
pub fn resolve_include(
    resolver: &mut Resolver<'_>,
    node: &TemplateNode,
) -> Result<TemplateNode, TemplateError> {
    let TemplateNode::Include(include) = node else {
        return Ok(node.clone());
    };

    let effective_origin = merge_origins(resolver.current_origin(), Some(&include.origin));
    let canonical = canon_key(include, &effective_origin);

    let resolved =
        resolver.resolve_include_body(&canonical, include.kind, &include.name, &effective_origin)?;

    Ok(TemplateNode::Include(IncludeNode {
        kind: include.kind,
        name: include.name.clone(),
        origin: resolved.origin,
        children: Some(resolved.ast),
        frontmatter: resolved.frontmatter,
    }))
}

fn canon_key(include: &IncludeNode, effective_origin: &str) -> String {
    if effective_origin == SELF_ORIGIN {
        format!("{}:{}", include.kind.as_str(), include.name)
    } else {
        format!("{}@{}:{}", include.kind.as_str(), effective_origin, include.name)
    }
}
