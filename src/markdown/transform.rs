//! Full Markdown adapter pipeline.
//!
//! Runs in the order: leading-H1 strip, heading-level shift, keep/drop
//! selection. Produces the processed text plus a metadata map suitable for
//! the processed-blob cache.

use std::collections::BTreeMap;

use serde_json::Value;

use super::intervals::{apply_intervals, build_drop_intervals, merge_intervals, Interval};
use super::model::{MarkdownCfg, PlaceholderPolicy};
use super::normalize::normalize_markdown;
use super::parser::parse_markdown;
use super::selectors::select_section_intervals;

pub type AdapterMeta = BTreeMap<String, Value>;

/// Processes one Markdown file through the adapter.
///
/// `group_size` is the number of files rendered together (H1 stripping only
/// applies to singleton groups); `mixed` marks language-mixed groups where
/// heading surgery is skipped.
pub fn process_markdown(
    text: &str,
    cfg: &MarkdownCfg,
    group_size: usize,
    mixed: bool,
) -> Result<(String, AdapterMeta), String> {
    cfg.validate()?;

    let mut meta = AdapterMeta::new();

    let (mut out, norm_meta) =
        normalize_markdown(text, cfg.max_heading_level, cfg.strip_h1, group_size, mixed);
    meta.insert("md.removed_h1".to_string(), Value::from(norm_meta.removed_h1 as u64));
    meta.insert("md.shifted".to_string(), Value::from(norm_meta.shifted));

    if let Some(keep) = &cfg.keep {
        let doc = parse_markdown(&out);
        let mut kept: Vec<(usize, usize)> = select_section_intervals(&doc, &keep.sections)?
            .into_iter()
            .map(|(start, end_excl, _, _)| (start, end_excl))
            .collect();
        if keep.frontmatter {
            if let Some(range) = doc.frontmatter_range {
                kept.push(range);
            }
        }
        let removal = complement_intervals(&kept, doc.line_count());
        let (text, _) = apply_intervals(&doc.lines, &removal, &PlaceholderPolicy::default());
        meta.insert("md.kept_sections".to_string(), Value::from(kept.len() as u64));
        out = text;
    }

    if let Some(drop) = &cfg.drop {
        let doc = parse_markdown(&out);
        let removal = build_drop_intervals(&doc, drop)?;
        let (text, placeholders) = apply_intervals(&doc.lines, &removal, &drop.placeholder);
        meta.insert("md.placeholders".to_string(), Value::from(placeholders as u64));
        out = text;
    }

    Ok((out, meta))
}

/// Lines not covered by any kept range, as removal intervals.
fn complement_intervals(kept: &[(usize, usize)], line_count: usize) -> Vec<Interval> {
    let kept = merge_intervals(
        kept.iter()
            .map(|&(start, end_excl)| Interval {
                start,
                end_excl,
                title: None,
                reason: None,
                placeholder: None,
            })
            .collect(),
    );

    let mut out = Vec::new();
    let mut cursor = 0;
    for iv in &kept {
        if cursor < iv.start {
            out.push(Interval {
                start: cursor,
                end_excl: iv.start,
                title: None,
                reason: None,
                placeholder: None,
            });
        }
        cursor = cursor.max(iv.end_excl);
    }
    if cursor < line_count {
        out.push(Interval {
            start: cursor,
            end_excl: line_count,
            title: None,
            reason: None,
            placeholder: None,
        });
    }
    out
}
