//! Configuration and intermediate representation for the Markdown pipeline.

use serde::{Deserialize, Serialize};

/// Markdown adapter configuration.
///
/// `drop` and `keep` are mutually exclusive: `drop` removes the selected
/// subtrees, `keep` removes everything but the selected subtrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkdownCfg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heading_level: Option<u8>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strip_h1: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop: Option<MarkdownDropCfg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep: Option<MarkdownKeepCfg>,
    /// Set when the placeholder that produced this config sits inside a
    /// heading line; the included document replaces the heading text.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder_inside_heading: bool,
}

impl MarkdownCfg {
    pub fn validate(&self) -> Result<(), String> {
        if self.drop.is_some() && self.keep.is_some() {
            return Err("cannot use both 'drop' and 'keep' modes simultaneously".to_string());
        }
        if let Some(level) = self.max_heading_level {
            if !(1..=6).contains(&level) {
                return Err(format!("max_heading_level must be 1..=6, got {}", level));
            }
        }
        Ok(())
    }
}

/// How a section rule matches a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Exact heading text.
    Text,
    /// GitHub-style slug of the heading text.
    Slug,
    /// Regular expression over the heading text.
    Regex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionMatch {
    pub kind: MatchKind,
    pub pattern: String,
    /// Regex flags, a subset of `i`, `m`, `s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

/// Selects heading subtrees by matcher and/or ancestor path, with optional
/// level bounds. At least one of `match`/`path` must be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionRule {
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub matcher: Option<SectionMatch>,
    /// Exact ancestor heading texts, outermost first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_exact: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_at_most: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_at_least: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Per-rule placeholder template overriding the policy template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Marker-delimited removal range; `start`/`end` are matched against lines
/// exactly, then trimmed, then with collapsed whitespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerRule {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub include_markers: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderMode {
    #[default]
    None,
    Summary,
}

/// What to leave behind for removed ranges. The template understands
/// `{title}`, `{lines}` and `{bytes}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceholderPolicy {
    #[serde(default)]
    pub mode: PlaceholderMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Default for PlaceholderPolicy {
    fn default() -> Self {
        Self {
            mode: PlaceholderMode::None,
            template: Some("> *(omitted: {title}; -{lines} lines)*".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkdownDropCfg {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<MarkerRule>,
    /// Drop YAML frontmatter as well. Defaults to true.
    #[serde(default = "default_true")]
    pub frontmatter: bool,
    #[serde(default)]
    pub placeholder: PlaceholderPolicy,
}

impl Default for MarkdownDropCfg {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            markers: Vec::new(),
            frontmatter: true,
            placeholder: PlaceholderPolicy::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkdownKeepCfg {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionRule>,
    /// Keep YAML frontmatter. Defaults to false.
    #[serde(default)]
    pub frontmatter: bool,
}

/// A heading and the extent of its subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingNode {
    /// 1..=6
    pub level: u8,
    /// Heading text without marks or underline.
    pub title: String,
    pub slug: String,
    /// 0-based line index of the heading line.
    pub start_line: usize,
    /// First line after this heading's subtree.
    pub end_line_excl: usize,
    /// Indices into the document's heading list, outermost first.
    pub parents: Vec<usize>,
}

/// Result of the lightweight Markdown scan.
#[derive(Debug, Clone, Default)]
pub struct ParsedDoc {
    pub lines: Vec<String>,
    pub headings: Vec<HeadingNode>,
    /// `[start, end_excl)` line ranges of fenced code blocks.
    pub fenced_ranges: Vec<(usize, usize)>,
    /// `[0, end_excl)` range of leading YAML frontmatter, if present.
    pub frontmatter_range: Option<(usize, usize)>,
}

impl ParsedDoc {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
