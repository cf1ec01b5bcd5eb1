//! Shared path and addressing helpers.
//!
//! Every scope keeps its templates under `<scope>/lg-cfg/`. Origins are
//! repository-relative POSIX paths (or `"self"` for the root scope) and
//! compose under inclusion.

use std::path::{Path, PathBuf};

use crate::run_context::SELF_ORIGIN;

use super::ResolverError;

pub const CFG_DIR: &str = "lg-cfg";

/// Composes origins across an include boundary: `"self"` is the identity,
/// otherwise the paths concatenate.
pub fn merge_origins(current: &str, child: Option<&str>) -> String {
    let child = match child {
        Some(child) if child != SELF_ORIGIN => child,
        _ => return current.to_string(),
    };
    if current == SELF_ORIGIN {
        child.to_string()
    } else {
        format!("{}/{}", current.trim_end_matches('/'), child)
    }
}

/// Rejects origins that could step outside the repository.
pub fn validate_origin(origin: &str) -> Result<(), ResolverError> {
    if origin == SELF_ORIGIN {
        return Ok(());
    }
    if origin.starts_with('/') || origin.contains('\\') {
        return Err(ResolverError::new(
            format!("origin must be repository-relative: '{}'", origin),
            origin.to_string(),
        ));
    }
    let escapes = origin
        .split('/')
        .any(|part| part == ".." || part.is_empty() || part == ".");
    if escapes {
        return Err(ResolverError::new(
            format!("origin escapes the repository: '{}'", origin),
            origin.to_string(),
        ));
    }
    Ok(())
}

/// Absolute scope directory for an origin.
pub fn scope_dir_for_origin(repo_root: &Path, origin: &str) -> Result<PathBuf, ResolverError> {
    validate_origin(origin)?;
    if origin == SELF_ORIGIN {
        Ok(repo_root.to_path_buf())
    } else {
        Ok(repo_root.join(origin))
    }
}

/// `lg-cfg/` directory of an origin's scope.
pub fn cfg_root_for_origin(repo_root: &Path, origin: &str) -> Result<PathBuf, ResolverError> {
    Ok(scope_dir_for_origin(repo_root, origin)?.join(CFG_DIR))
}

/// Loads `<cfg_root>/<resource><suffix>`.
pub fn load_from_cfg(
    cfg_root: &Path,
    resource: &str,
    suffix: &str,
) -> Result<(PathBuf, String), ResolverError> {
    let path = cfg_root.join(format!("{}{}", resource, suffix));
    let text = std::fs::read_to_string(&path).map_err(|err| {
        ResolverError::new(
            format!("resource not found: {} ({})", path.display(), err),
            resource.to_string(),
        )
    })?;
    Ok((path, text))
}

/// Splits an addressed section name (`@origin:name` or `@[origin]:name`)
/// into its origin and bare name. Plain names pass through unchanged.
pub fn split_section_address(section_name: &str) -> Result<(Option<&str>, &str), ResolverError> {
    if let Some(rest) = section_name.strip_prefix("@[") {
        let close = rest.find("]:").ok_or_else(|| {
            ResolverError::new(
                format!("invalid section reference (missing ']:'): {}", section_name),
                section_name.to_string(),
            )
        })?;
        let origin = &rest[..close];
        let name = &rest[close + 2..];
        if origin.is_empty() || name.is_empty() {
            return Err(ResolverError::new(
                format!("invalid section reference: {}", section_name),
                section_name.to_string(),
            ));
        }
        return Ok((Some(origin), name));
    }
    if let Some(rest) = section_name.strip_prefix('@') {
        let colon = rest.find(':').ok_or_else(|| {
            ResolverError::new(
                format!("invalid section reference (missing ':'): {}", section_name),
                section_name.to_string(),
            )
        })?;
        let origin = &rest[..colon];
        let name = &rest[colon + 1..];
        if origin.is_empty() || name.is_empty() {
            return Err(ResolverError::new(
                format!("invalid section reference: {}", section_name),
                section_name.to_string(),
            ));
        }
        return Ok((Some(origin), name));
    }
    Ok((None, section_name))
}
