//! Removal intervals: construction, merging, and application.

use super::model::{MarkdownDropCfg, ParsedDoc, PlaceholderPolicy};
use super::placeholders::render_placeholder;
use super::selectors::{select_marker_intervals, select_section_intervals};

/// A half-open `[start, end_excl)` line range scheduled for removal.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub start: usize,
    pub end_excl: usize,
    pub title: Option<String>,
    pub reason: Option<String>,
    /// Per-interval placeholder template override.
    pub placeholder: Option<String>,
}

/// Merges overlapping and touching intervals. The title/reason/placeholder
/// of the widest contributing interval wins.
pub fn merge_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    if intervals.is_empty() {
        return intervals;
    }
    intervals.sort_by_key(|iv| (iv.start, iv.end_excl));

    let mut merged: Vec<Interval> = Vec::new();
    let mut current = intervals[0].clone();
    let mut best_width = current.end_excl.saturating_sub(current.start);

    for iv in intervals.into_iter().skip(1) {
        if iv.start <= current.end_excl {
            let width = iv.end_excl.saturating_sub(iv.start);
            if iv.end_excl > current.end_excl {
                current.end_excl = iv.end_excl;
            }
            if width > best_width {
                best_width = width;
                current.title = iv.title;
                current.reason = iv.reason;
                current.placeholder = iv.placeholder;
            }
        } else {
            merged.push(current);
            current = iv;
            best_width = current.end_excl.saturating_sub(current.start);
        }
    }
    merged.push(current);
    merged
}

/// Builds the merged removal plan for a `drop` configuration.
pub fn build_drop_intervals(doc: &ParsedDoc, cfg: &MarkdownDropCfg) -> Result<Vec<Interval>, String> {
    let mut intervals = Vec::new();

    for (start, end_excl, rule, heading) in select_section_intervals(doc, &cfg.sections)? {
        intervals.push(Interval {
            start,
            end_excl,
            title: Some(heading.title.clone()),
            reason: rule.reason.clone(),
            placeholder: rule.placeholder.clone(),
        });
    }

    for (start, end_excl, rule) in select_marker_intervals(&doc.lines, &cfg.markers) {
        intervals.push(Interval {
            start,
            end_excl,
            title: None,
            reason: rule.reason.clone(),
            placeholder: rule.placeholder.clone(),
        });
    }

    if cfg.frontmatter {
        if let Some((start, end_excl)) = doc.frontmatter_range {
            intervals.push(Interval {
                start,
                end_excl,
                title: None,
                reason: Some("frontmatter".to_string()),
                placeholder: None,
            });
        }
    }

    Ok(merge_intervals(intervals))
}

/// Applies merged removal intervals, inserting placeholder lines per policy.
/// Returns the new text and the number of placeholders emitted.
pub fn apply_intervals(
    lines: &[String],
    intervals: &[Interval],
    policy: &PlaceholderPolicy,
) -> (String, usize) {
    if intervals.is_empty() {
        return (lines.join("\n"), 0);
    }

    let n = lines.len();
    let mut out: Vec<String> = Vec::with_capacity(n);
    let mut cursor = 0;
    let mut emitted = 0;

    for iv in intervals {
        let start = iv.start.min(n);
        let end = iv.end_excl.min(n);
        if end <= start {
            continue;
        }
        if cursor < start {
            out.extend(lines[cursor..start].iter().cloned());
        }
        let removed_lines = end - start;
        let removed_bytes: usize = lines[start..end].iter().map(|l| l.len() + 1).sum();
        let placeholder = render_placeholder(
            removed_lines,
            removed_bytes,
            iv.title.as_deref(),
            policy,
            iv.placeholder.as_deref(),
        );
        if !placeholder.is_empty() {
            out.push(placeholder);
            emitted += 1;
        }
        cursor = end;
    }

    if cursor < n {
        out.extend(lines[cursor..].iter().cloned());
    }

    (out.join("\n"), emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::model::PlaceholderMode;

    fn iv(start: usize, end_excl: usize) -> Interval {
        Interval {
            start,
            end_excl,
            title: None,
            reason: None,
            placeholder: None,
        }
    }

    #[test]
    fn merges_overlapping_and_touching() {
        let merged = merge_intervals(vec![iv(0, 3), iv(3, 5), iv(7, 9), iv(8, 10)]);
        assert_eq!(
            merged.iter().map(|i| (i.start, i.end_excl)).collect::<Vec<_>>(),
            vec![(0, 5), (7, 10)]
        );
    }

    #[test]
    fn widest_interval_supplies_metadata() {
        let mut a = iv(0, 2);
        a.title = Some("narrow".to_string());
        let mut b = iv(1, 6);
        b.title = Some("wide".to_string());
        let merged = merge_intervals(vec![a, b]);
        assert_eq!(merged[0].title.as_deref(), Some("wide"));
    }

    #[test]
    fn apply_replaces_range_with_placeholder() {
        let lines: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let policy = PlaceholderPolicy {
            mode: PlaceholderMode::Summary,
            template: Some("[cut {lines}]".to_string()),
        };
        let (text, emitted) = apply_intervals(&lines, &[iv(1, 3)], &policy);
        assert_eq!(text, "a\n[cut 2]\nd");
        assert_eq!(emitted, 1);
    }

    #[test]
    fn none_policy_drops_silently() {
        let lines: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let (text, emitted) = apply_intervals(&lines, &[iv(1, 2)], &PlaceholderPolicy::default());
        assert_eq!(text, "a\nc");
        assert_eq!(emitted, 0);
    }
}
