//! Markdown normalization pipeline.
//!
//! A deterministic, line-oriented transform used when Markdown files are
//! pulled into a rendered context: heading-level shifting, leading-H1
//! stripping, and keep/drop selection of whole heading subtrees.
//!
//! The pipeline never interprets Markdown beyond what it needs: fenced code
//! regions, ATX and Setext headings, horizontal rules, and YAML frontmatter.
//! Everything inside fenced regions is opaque.

pub mod intervals;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod placeholders;
pub mod selectors;
pub mod slug;
pub mod transform;

pub use model::{
    HeadingNode, MarkdownCfg, MarkdownDropCfg, MarkdownKeepCfg, MarkerRule, MatchKind, ParsedDoc,
    PlaceholderPolicy, SectionMatch, SectionRule,
};
pub use normalize::normalize_markdown;
pub use parser::parse_markdown;
pub use slug::slugify_github;
pub use transform::process_markdown;
