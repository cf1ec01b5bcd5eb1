//! Lightweight Markdown scanner.
//!
//! Recognizes just enough structure for the normalization pipeline: fenced
//! code blocks (backticks or tildes, three or more), ATX and Setext
//! headings with their subtree extents and ancestor chains, and leading
//! YAML frontmatter.

use regex::Regex;
use std::sync::OnceLock;

use super::model::{HeadingNode, ParsedDoc};
use super::slug::slugify_github;

fn atx_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ {0,3}(?P<marks>#{1,6})[ \t]+(?P<title>.+?)\s*$").unwrap())
}

fn setext_h1_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^={2,}\s*$").unwrap())
}

fn setext_h2_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-{2,}\s*$").unwrap())
}

fn fence_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ {0,3}(?P<fence>`{3,}|~{3,})").unwrap())
}

fn frontmatter_line_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ {0,3}-{3,}\s*$").unwrap())
}

/// Scans `[start, end_excl)` ranges of fenced blocks. An unclosed fence
/// runs to the end of the document.
pub(crate) fn scan_fenced(lines: &[&str]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut i = 0;
    let n = lines.len();
    while i < n {
        let Some(caps) = fence_pattern().captures(lines[i]) else {
            i += 1;
            continue;
        };
        let open_marks = caps.name("fence").unwrap().as_str();
        let tick = open_marks.chars().next().unwrap();
        let need = open_marks.len();
        let start = i;
        i += 1;
        let mut closed = false;
        while i < n {
            if is_closing_fence(lines[i], tick, need) {
                closed = true;
                break;
            }
            i += 1;
        }
        if closed {
            out.push((start, i + 1));
            i += 1;
        } else {
            out.push((start, n));
            break;
        }
    }
    out
}

fn is_closing_fence(line: &str, tick: char, need: usize) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let marks = trimmed.chars().take_while(|&c| c == tick).count();
    marks >= need && trimmed.chars().skip(marks).all(|c| c == ' ' || c == '\t')
}

pub(crate) fn in_any_range(i: usize, ranges: &[(usize, usize)]) -> bool {
    ranges.iter().any(|&(a, b)| a <= i && i < b)
}

/// Frontmatter only counts when it opens on the very first line. The range
/// swallows trailing blank lines after the closing delimiter.
fn scan_frontmatter(lines: &[&str], fenced: &[(usize, usize)]) -> Option<(usize, usize)> {
    if lines.is_empty() || !frontmatter_line_pattern().is_match(lines[0]) {
        return None;
    }
    let n = lines.len();
    let mut i = 1;
    while i < n {
        if in_any_range(i, fenced) {
            return None;
        }
        if frontmatter_line_pattern().is_match(lines[i]) {
            let mut end_excl = i + 1;
            while end_excl < n && lines[end_excl].trim().is_empty() {
                end_excl += 1;
            }
            return Some((0, end_excl));
        }
        i += 1;
    }
    None
}

/// Parses a Markdown string into its structural skeleton.
pub fn parse_markdown(text: &str) -> ParsedDoc {
    let lines: Vec<&str> = text.split('\n').collect();
    let fenced = scan_fenced(&lines);
    let frontmatter_range = scan_frontmatter(&lines, &fenced);

    let mut headings: Vec<HeadingNode> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if in_any_range(i, &fenced) {
            continue;
        }
        if let Some(caps) = atx_pattern().captures(line) {
            let level = caps.name("marks").unwrap().as_str().len() as u8;
            let title = caps.name("title").unwrap().as_str().trim().to_string();
            let slug = slugify_github(&title);
            headings.push(HeadingNode {
                level,
                title,
                slug,
                start_line: i,
                end_line_excl: 0,
                parents: Vec::new(),
            });
        }
    }

    // Setext: a non-empty line underlined by ==== or ----.
    let mut i = 0;
    while i + 1 < lines.len() {
        if in_any_range(i, &fenced) || in_any_range(i + 1, &fenced) {
            i += 1;
            continue;
        }
        let title = lines[i].trim();
        let under = lines[i + 1].trim();
        let level = if setext_h1_pattern().is_match(under) {
            Some(1)
        } else if setext_h2_pattern().is_match(under) {
            Some(2)
        } else {
            None
        };
        match level {
            Some(level) if !title.is_empty() && !atx_pattern().is_match(lines[i]) => {
                let slug = slugify_github(title);
                headings.push(HeadingNode {
                    level,
                    title: title.to_string(),
                    slug,
                    start_line: i,
                    end_line_excl: 0,
                    parents: Vec::new(),
                });
                i += 2;
            }
            _ => i += 1,
        }
    }

    headings.sort_by_key(|h| h.start_line);

    // Ancestor chains via a level stack.
    let mut stack: Vec<usize> = Vec::new();
    let levels: Vec<u8> = headings.iter().map(|h| h.level).collect();
    for (idx, heading) in headings.iter_mut().enumerate() {
        while let Some(&top) = stack.last() {
            if levels[top] >= heading.level {
                stack.pop();
            } else {
                break;
            }
        }
        heading.parents = stack.clone();
        stack.push(idx);
    }

    // Subtree extent: up to the next heading of the same or shallower level.
    let starts: Vec<(usize, u8)> = headings.iter().map(|h| (h.start_line, h.level)).collect();
    for (i, heading) in headings.iter_mut().enumerate() {
        let mut end = lines.len();
        for &(start, level) in &starts[i + 1..] {
            if level <= heading.level {
                end = start;
                break;
            }
        }
        heading.end_line_excl = end;
    }

    ParsedDoc {
        lines: lines.iter().map(|s| s.to_string()).collect(),
        headings,
        fenced_ranges: fenced,
        frontmatter_range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_atx_and_setext_headings() {
        let doc = parse_markdown("# One\n\nIntro\n\nTwo\n---\n\n## Nested\n");
        let titles: Vec<_> = doc.headings.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two", "Nested"]);
        assert_eq!(doc.headings[1].level, 2);
        assert_eq!(doc.headings[2].parents, vec![0]);
    }

    #[test]
    fn heading_subtrees_extend_to_sibling() {
        let doc = parse_markdown("# A\ntext\n## B\nbody\n## C\nbody\n# D\n");
        let b = &doc.headings[1];
        assert_eq!(b.title, "B");
        assert_eq!((b.start_line, b.end_line_excl), (2, 4));
        let a = &doc.headings[0];
        assert_eq!((a.start_line, a.end_line_excl), (0, 6));
    }

    #[test]
    fn fenced_blocks_hide_headings() {
        let doc = parse_markdown("```\n# not a heading\n```\n# real\n");
        assert_eq!(doc.headings.len(), 1);
        assert_eq!(doc.headings[0].title, "real");
        assert_eq!(doc.fenced_ranges, vec![(0, 3)]);
    }

    #[test]
    fn tilde_fences_with_longer_closers() {
        let doc = parse_markdown("~~~~\ncode\n~~~\nstill code\n~~~~\n# after\n");
        assert_eq!(doc.fenced_ranges, vec![(0, 5)]);
        assert_eq!(doc.headings[0].title, "after");
    }

    #[test]
    fn frontmatter_range_swallows_blank_lines() {
        let doc = parse_markdown("---\ntitle: x\n---\n\n\n# Body\n");
        assert_eq!(doc.frontmatter_range, Some((0, 5)));
    }

    #[test]
    fn frontmatter_requires_first_line() {
        let doc = parse_markdown("\n---\ntitle: x\n---\n");
        assert_eq!(doc.frontmatter_range, None);
    }
}
