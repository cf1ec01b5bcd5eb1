//! Section references, virtual section configuration, and a file-based
//! Markdown section service.
//!
//! A *section* is a named, filter-defined collection of files rendered into
//! one string. The engine itself only hands a resolved [`SectionRef`] to a
//! host-supplied handler; the [`MarkdownSectionService`] here is the
//! concrete handler used for virtual sections created by Markdown-file
//! placeholders (and by tests).

use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;
use serde::Serialize;
use walkdir::WalkDir;

use crate::cache::Cache;
use crate::markdown::{process_markdown, MarkdownCfg};

/// A resolved reference to a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionRef {
    /// Canonical section name within its scope.
    pub name: String,
    /// Scope directory relative to the repository root, `""` for the root
    /// scope.
    pub scope_rel: String,
    /// Absolute scope directory.
    pub scope_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Default-deny; only `allow` entries pass.
    Allow,
    /// Default-allow; `block` entries are rejected.
    Block,
}

/// File filter for a section. Paths are scope-relative, `/`-anchored POSIX
/// paths and may contain `*` / `**` globs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterNode {
    pub mode: FilterMode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub block: Vec<String>,
}

impl FilterNode {
    pub fn allow_only(paths: Vec<String>) -> Self {
        Self {
            mode: FilterMode::Allow,
            allow: paths,
            block: Vec::new(),
        }
    }
}

/// Configuration of a (virtual) section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionCfg {
    /// Accepted file extensions, e.g. `[".md"]`.
    pub extensions: Vec<String>,
    pub filters: FilterNode,
    /// Markdown adapter configuration for the section's files.
    pub markdown: MarkdownCfg,
}

/// Translates a `/`-anchored glob into an anchored regex. `**` crosses
/// directory separators, `*` and `?` do not.
fn glob_to_regex(pattern: &str) -> Result<Regex, String> {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            other => {
                if regex_syntax_special(other) {
                    out.push('\\');
                }
                out.push(other);
            }
        }
    }
    out.push('$');
    Regex::new(&out).map_err(|e| format!("invalid glob '{}': {}", pattern, e))
}

fn regex_syntax_special(ch: char) -> bool {
    matches!(
        ch,
        '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\'
    )
}

fn contains_glob(path: &str) -> bool {
    path.contains('*') || path.contains('?')
}

/// Renders virtual sections by reading Markdown files from disk.
pub struct MarkdownSectionService<'a> {
    cache: Option<&'a Cache>,
}

impl<'a> MarkdownSectionService<'a> {
    pub fn new(cache: Option<&'a Cache>) -> Self {
        Self { cache }
    }

    /// Expands the section's allow filter under the scope directory and
    /// renders every matched file through the Markdown adapter,
    /// concatenated with blank lines.
    ///
    /// A glob matching nothing renders to an empty string; a missing
    /// concrete file is an error.
    pub fn render(&self, section_ref: &SectionRef, cfg: &SectionCfg) -> Result<String, String> {
        let files = self.expand_files(&section_ref.scope_dir, cfg)?;
        let group_size = files.len();
        debug!(
            "section {}: {} file(s) in scope {}",
            section_ref.name,
            group_size,
            section_ref.scope_dir.display()
        );

        let mut parts = Vec::with_capacity(files.len());
        for file in files {
            parts.push(self.render_file(&file, &cfg.markdown, group_size)?);
        }
        Ok(parts.join("\n\n"))
    }

    fn render_file(
        &self,
        path: &Path,
        markdown: &MarkdownCfg,
        group_size: usize,
    ) -> Result<String, String> {
        let fingerprint = serde_json::to_value(markdown)
            .map_err(|e| format!("cannot fingerprint markdown config: {}", e))?;

        if let Some(cache) = self.cache {
            let (hash, entry) = cache.build_key(path, "markdown", &fingerprint, group_size);
            if let Some(blob) = cache.get_processed(&entry) {
                return Ok(blob.processed_text);
            }
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            let (processed, meta) = process_markdown(&text, markdown, group_size, false)?;
            cache.put_processed(&hash, &entry, &processed, &meta);
            return Ok(processed);
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let (processed, _meta) = process_markdown(&text, markdown, group_size, false)?;
        Ok(processed)
    }

    fn expand_files(&self, scope_dir: &Path, cfg: &SectionCfg) -> Result<Vec<PathBuf>, String> {
        let mut files: Vec<PathBuf> = Vec::new();

        for entry in &cfg.filters.allow {
            let rel = entry.trim_start_matches('/');
            if contains_glob(rel) {
                files.extend(self.expand_glob(scope_dir, rel, &cfg.extensions)?);
            } else {
                let path = scope_dir.join(rel);
                if !path.is_file() {
                    return Err(format!("file not found: {}", path.display()));
                }
                files.push(path);
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }

    fn expand_glob(
        &self,
        scope_dir: &Path,
        pattern: &str,
        extensions: &[String],
    ) -> Result<Vec<PathBuf>, String> {
        let regex = glob_to_regex(pattern)?;
        let mut out = Vec::new();
        for entry in WalkDir::new(scope_dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(scope_dir) else {
                continue;
            };
            let rel_posix = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let matches_ext = extensions.is_empty()
                || extensions.iter().any(|ext| rel_posix.ends_with(ext.as_str()));
            if matches_ext && regex.is_match(&rel_posix) {
                out.push(entry.path().to_path_buf());
            }
        }
        Ok(out)
    }
}
