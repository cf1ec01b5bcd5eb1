//! Heading-level normalization and leading-H1 stripping.

use regex::Regex;
use std::sync::OnceLock;

use super::parser::{in_any_range, scan_fenced};

fn head_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#+)\s").unwrap())
}

fn setext_h1_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^={2,}\s*$").unwrap())
}

fn atx_h1_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#\s").unwrap())
}

/// Outcome flags of a normalization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeMeta {
    pub removed_h1: bool,
    pub shifted: bool,
}

/// Removes a leading H1 (ATX or Setext) when the file stands alone in its
/// group.
fn strip_leading_h1(lines: &mut Vec<String>, group_size: usize) -> bool {
    if group_size != 1 || lines.is_empty() {
        return false;
    }
    if atx_h1_pattern().is_match(&lines[0]) {
        lines.remove(0);
        return true;
    }
    if lines.len() >= 2 && !lines[0].trim().is_empty() && setext_h1_pattern().is_match(&lines[1]) {
        lines.drain(0..2);
        return true;
    }
    false
}

/// Shifts heading levels outside fenced blocks so that the shallowest
/// heading lands on `max_heading_level`, then strips a leading H1 when
/// requested and the file is alone in its group.
///
/// With `mixed` set or no target level, only the H1 strip applies: the
/// group mixes languages and heading surgery would be misleading.
pub fn normalize_markdown(
    text: &str,
    max_heading_level: Option<u8>,
    strip_h1: bool,
    group_size: usize,
    mixed: bool,
) -> (String, NormalizeMeta) {
    let mut meta = NormalizeMeta::default();
    let mut lines: Vec<String> = text.split('\n').map(|s| s.to_string()).collect();

    if strip_h1 {
        meta.removed_h1 = strip_leading_h1(&mut lines, group_size);
    }

    let target = match max_heading_level {
        Some(level) if !mixed => i32::from(level),
        _ => return (lines.join("\n"), meta),
    };

    let line_refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    let fenced = scan_fenced(&line_refs);

    let mut min_level: Option<i32> = None;
    for (i, line) in lines.iter().enumerate() {
        if in_any_range(i, &fenced) {
            continue;
        }
        if let Some(caps) = head_pattern().captures(line) {
            let level = caps.get(1).unwrap().as_str().len() as i32;
            min_level = Some(min_level.map_or(level, |m| m.min(level)));
        }
    }

    let Some(min_level) = min_level else {
        return (lines.join("\n"), meta);
    };

    let shift = target - min_level;
    meta.shifted = shift != 0 || meta.removed_h1;
    if shift == 0 {
        return (lines.join("\n"), meta);
    }

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if in_any_range(i, &fenced) {
            out.push(line.clone());
            continue;
        }
        if let Some(caps) = head_pattern().captures(line) {
            let marks = caps.get(1).unwrap().as_str().len() as i32;
            let new_level = (marks + shift).clamp(1, 6) as usize;
            let rest = &line[caps.get(0).unwrap().end()..];
            out.push(format!("{} {}", "#".repeat(new_level), rest));
        } else {
            out.push(line.clone());
        }
    }

    (out.join("\n"), meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_headings_to_target_minimum() {
        let (text, meta) = normalize_markdown("# A\n## B\n", Some(3), false, 1, false);
        assert_eq!(text, "### A\n#### B\n");
        assert!(meta.shifted);
    }

    #[test]
    fn already_at_target_is_untouched() {
        let (text, meta) = normalize_markdown("## A\n### B\n", Some(2), false, 1, false);
        assert_eq!(text, "## A\n### B\n");
        assert!(!meta.shifted);
    }

    #[test]
    fn strips_atx_h1_when_alone_in_group() {
        let (text, meta) = normalize_markdown("# Title\nbody\n", None, true, 1, false);
        assert_eq!(text, "body\n");
        assert!(meta.removed_h1);
    }

    #[test]
    fn strips_setext_h1() {
        let (text, meta) = normalize_markdown("Title\n====\nbody\n", None, true, 1, false);
        assert_eq!(text, "body\n");
        assert!(meta.removed_h1);
    }

    #[test]
    fn keeps_h1_in_multi_file_group() {
        let (text, meta) = normalize_markdown("# Title\nbody\n", None, true, 3, false);
        assert_eq!(text, "# Title\nbody\n");
        assert!(!meta.removed_h1);
    }

    #[test]
    fn no_h1_leaves_file_unchanged() {
        let (text, _) = normalize_markdown("## Not an H1\nbody\n", None, true, 1, false);
        assert_eq!(text, "## Not an H1\nbody\n");
    }

    #[test]
    fn fenced_blocks_are_immune_to_shift() {
        let input = "## A\n```\n# comment in code\n```\n";
        let (text, _) = normalize_markdown(input, Some(1), false, 1, false);
        assert_eq!(text, "# A\n```\n# comment in code\n```\n");
    }

    #[test]
    fn shift_clamps_at_h6() {
        let (text, _) = normalize_markdown("# A\n#### Deep\n", Some(5), false, 1, false);
        assert_eq!(text, "##### A\n###### Deep\n");
    }

    #[test]
    fn mixed_groups_skip_heading_surgery() {
        let (text, _) = normalize_markdown("# A\n", Some(3), false, 1, true);
        assert_eq!(text, "# A\n");
    }
}
