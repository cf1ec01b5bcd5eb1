//! Heading-context analysis for Markdown-file placeholders.
//!
//! Inspects the template AST around a `${md:...}` node to pick the
//! heading normalization for the included document:
//!
//! * a placeholder sitting *inside* a heading line inherits that heading's
//!   level and keeps its H1 (the document title replaces the heading text);
//! * with no parent heading, or isolated by a horizontal rule, the
//!   document comes in as a root section (level 1);
//! * otherwise it nests one level under its parent heading, and the
//!   leading H1 is stripped unless the placeholder is part of a continuous
//!   chain of placeholders (a run with no separating heading or rule).

use regex::Regex;
use std::sync::OnceLock;

use super::super::nodes::TemplateNode;

/// Outcome of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingContext {
    pub continuous_chain: bool,
    pub inside_heading: bool,
    pub heading_level: u8,
    pub strip_h1: bool,
}

#[derive(Debug, Clone)]
struct HeadingInfo {
    line: usize,
    level: u8,
}

fn atx_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap())
}

/// Heading marks with nothing after them, e.g. `### ` before a placeholder.
fn atx_marks_only() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,6})\s*$").unwrap())
}

fn setext_h1() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^=+\s*$").unwrap())
}

fn setext_h2() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-+\s*$").unwrap())
}

fn fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(```|~~~)").unwrap())
}

fn horizontal_rule() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ {0,3}((-[ \t]*){3,}|(\*[ \t]*){3,}|(_[ \t]*){3,})$").unwrap())
}

/// Analyzes the surroundings of `ast[index]` (a Markdown-file node).
pub fn detect_heading_context(ast: &[TemplateNode], index: usize) -> HeadingContext {
    let headings = parse_all_headings(ast);
    let rules = parse_all_horizontal_rules(ast);

    let placeholder_line = node_line(ast, index);
    let inside_heading = is_inside_heading(ast, index);

    let parent_level = find_parent_heading_level(placeholder_line, &headings, &rules);
    let chain = is_continuous_chain(ast, index, &headings, &rules);
    let isolated_by_rule = is_isolated_by_rule(placeholder_line, &headings, &rules);

    let (heading_level, strip_h1) =
        calculate_parameters(inside_heading, parent_level, chain, isolated_by_rule);

    HeadingContext {
        continuous_chain: chain,
        inside_heading,
        heading_level,
        strip_h1,
    }
}

/// Line accounting: a text node spans `newlines + 1` lines, any other node
/// spans one line.
fn node_span(node: &TemplateNode) -> usize {
    match node {
        TemplateNode::Text(text) => text.text.matches('\n').count() + 1,
        _ => 1,
    }
}

fn node_line(ast: &[TemplateNode], index: usize) -> usize {
    ast[..index].iter().map(node_span).sum()
}

fn parse_all_headings(ast: &[TemplateNode]) -> Vec<HeadingInfo> {
    let mut headings = Vec::new();
    let mut current_line = 0;

    for (node_index, node) in ast.iter().enumerate() {
        if let TemplateNode::Text(text) = node {
            headings.extend(headings_in_text(&text.text, current_line));
            if let Some(placeholder_heading) =
                placeholder_heading(ast, node_index, current_line)
            {
                headings.push(placeholder_heading);
            }
        }
        current_line += node_span(node);
    }

    headings.sort_by_key(|h| h.line);
    headings
}

fn headings_in_text(text: &str, start_line: usize) -> Vec<HeadingInfo> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = Vec::new();
    let mut in_fence = false;

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if fence().is_match(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = atx_heading().captures(line) {
            out.push(HeadingInfo {
                line: start_line + i,
                level: caps.get(1).unwrap().as_str().len() as u8,
            });
            continue;
        }
        if i + 1 < lines.len() && !line.is_empty() {
            let under = lines[i + 1].trim();
            if setext_h1().is_match(under) {
                out.push(HeadingInfo {
                    line: start_line + i,
                    level: 1,
                });
            } else if setext_h2().is_match(under) {
                out.push(HeadingInfo {
                    line: start_line + i,
                    level: 2,
                });
            }
        }
    }
    out
}

/// A text node whose last line is bare heading marks, immediately followed
/// by a Markdown placeholder: the placeholder is the heading's text.
fn placeholder_heading(
    ast: &[TemplateNode],
    node_index: usize,
    current_line: usize,
) -> Option<HeadingInfo> {
    let TemplateNode::Text(text) = &ast[node_index] else {
        return None;
    };
    if !matches!(ast.get(node_index + 1), Some(TemplateNode::MarkdownFile(_))) {
        return None;
    }
    let last_line = text.text.split('\n').last()?;
    let caps = atx_marks_only().captures(last_line)?;
    Some(HeadingInfo {
        line: current_line + text.text.matches('\n').count(),
        level: caps.get(1).unwrap().as_str().len() as u8,
    })
}

fn parse_all_horizontal_rules(ast: &[TemplateNode]) -> Vec<usize> {
    let mut rules = Vec::new();
    let mut current_line = 0;

    for node in ast {
        if let TemplateNode::Text(text) = node {
            let lines: Vec<&str> = text.text.split('\n').collect();
            let mut in_fence = false;
            for (i, raw) in lines.iter().enumerate() {
                let line = raw.trim();
                if fence().is_match(line) {
                    in_fence = !in_fence;
                    continue;
                }
                if in_fence {
                    continue;
                }
                if horizontal_rule().is_match(raw) && !is_setext_underline(&lines, i) {
                    rules.push(current_line + i);
                }
            }
        }
        current_line += node_span(node);
    }

    rules
}

/// `---` under a text line is a Setext underline, not a rule.
fn is_setext_underline(lines: &[&str], line_index: usize) -> bool {
    if line_index == 0 {
        return false;
    }
    let prev = lines[line_index - 1].trim();
    if prev.is_empty() {
        return false;
    }
    !(atx_heading().is_match(prev) || fence().is_match(prev) || horizontal_rule().is_match(prev))
}

/// The placeholder shares a line with heading marks in the adjacent text.
fn is_inside_heading(ast: &[TemplateNode], index: usize) -> bool {
    heading_marks_before(ast, index) || heading_continues_after(ast, index)
}

fn heading_marks_before(ast: &[TemplateNode], index: usize) -> bool {
    if index == 0 {
        return false;
    }
    let TemplateNode::Text(prev) = &ast[index - 1] else {
        return false;
    };
    if prev.text.ends_with('\n') {
        return false;
    }
    let last_line = prev.text.split('\n').last().unwrap_or("");
    atx_heading().is_match(last_line) || atx_marks_only().is_match(last_line)
}

fn heading_continues_after(ast: &[TemplateNode], index: usize) -> bool {
    let Some(TemplateNode::Text(next)) = ast.get(index + 1) else {
        return false;
    };
    if next.text.starts_with('\n') {
        return false;
    }
    heading_marks_before(ast, index)
}

fn find_parent_heading_level(
    placeholder_line: usize,
    headings: &[HeadingInfo],
    rules: &[usize],
) -> Option<u8> {
    // a horizontal rule shadows every heading before it
    let start_line = rules
        .iter()
        .take_while(|&&rule| rule < placeholder_line)
        .last()
        .copied()
        .unwrap_or(0);

    let mut parent = None;
    for heading in headings {
        if heading.line >= placeholder_line {
            break;
        }
        if heading.line >= start_line {
            parent = Some(heading.level);
        }
    }
    parent
}

fn is_isolated_by_rule(
    placeholder_line: usize,
    headings: &[HeadingInfo],
    rules: &[usize],
) -> bool {
    let Some(closest_rule) = rules
        .iter()
        .take_while(|&&rule| rule < placeholder_line)
        .last()
        .copied()
    else {
        return false;
    };
    !headings
        .iter()
        .any(|h| closest_rule < h.line && h.line < placeholder_line)
}

/// Placeholders indices that participate in chain analysis (glob nodes
/// always chain; in-heading placeholders never do).
fn regular_md_indices(ast: &[TemplateNode]) -> Vec<usize> {
    ast.iter()
        .enumerate()
        .filter(|(i, node)| {
            matches!(node, TemplateNode::MarkdownFile(_)) && !is_inside_heading(ast, *i)
        })
        .map(|(i, _)| i)
        .collect()
}

fn is_continuous_chain(
    ast: &[TemplateNode],
    target_index: usize,
    headings: &[HeadingInfo],
    rules: &[usize],
) -> bool {
    if let TemplateNode::MarkdownFile(node) = &ast[target_index] {
        if node.is_glob {
            return true;
        }
    }

    let indices = regular_md_indices(ast);
    if indices.len() <= 1 {
        return analyze_single_placeholder(ast, target_index, headings, rules);
    }

    let segments = split_by_rules(ast, &indices, rules);
    let Some(segment) = segments.iter().find(|seg| seg.contains(&target_index)) else {
        return analyze_single_placeholder(ast, target_index, headings, rules);
    };

    if segment.len() <= 1 {
        return false;
    }

    for pair in segment.windows(2) {
        let start_line = node_line(ast, pair[0]);
        let end_line = node_line(ast, pair[1]);
        let has_heading_between = headings
            .iter()
            .any(|h| start_line < h.line && h.line < end_line);
        if has_heading_between {
            return false;
        }
    }
    true
}

/// A lone placeholder chains unless fenced between horizontal rules or
/// between headings where the following one does not nest deeper.
fn analyze_single_placeholder(
    ast: &[TemplateNode],
    index: usize,
    headings: &[HeadingInfo],
    rules: &[usize],
) -> bool {
    if let TemplateNode::MarkdownFile(node) = &ast[index] {
        if node.is_glob {
            return true;
        }
    }

    let line = node_line(ast, index);

    let rules_before = rules.iter().any(|&r| r < line);
    let rules_after = rules.iter().any(|&r| r > line);
    if rules_before && rules_after {
        return false;
    }

    let last_before = headings.iter().filter(|h| h.line < line).last();
    let first_after = headings.iter().find(|h| h.line > line);
    if let (Some(before), Some(after)) = (last_before, first_after) {
        if after.level <= before.level {
            return false;
        }
    }
    true
}

/// Splits placeholder indices into segments separated by horizontal rules.
fn split_by_rules(ast: &[TemplateNode], indices: &[usize], rules: &[usize]) -> Vec<Vec<usize>> {
    if rules.is_empty() {
        return vec![indices.to_vec()];
    }

    let mut segments: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();

    for &index in indices {
        let line = node_line(ast, index);
        if let Some(&prev_index) = current.last() {
            let prev_line = node_line(ast, prev_index);
            let rule_between = rules.iter().any(|&r| prev_line < r && r < line);
            if rule_between {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push(index);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// The decision table: inside-heading keeps the parent level, missing
/// parent or rule isolation resets to root, everything else nests one
/// deeper with H1 stripping tied to chain membership.
fn calculate_parameters(
    inside_heading: bool,
    parent_level: Option<u8>,
    chain: bool,
    isolated_by_rule: bool,
) -> (u8, bool) {
    if inside_heading {
        return (parent_level.unwrap_or(1), false);
    }
    let Some(parent_level) = parent_level else {
        return (1, false);
    };
    if isolated_by_rule {
        return (1, false);
    }
    ((parent_level + 1).min(6), !chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::nodes::MarkdownFileNode;

    fn md_node() -> TemplateNode {
        TemplateNode::MarkdownFile(MarkdownFileNode {
            path: "docs/a".to_string(),
            origin: None,
            heading_level: None,
            strip_h1: None,
            anchor: None,
            condition: None,
            is_glob: false,
        })
    }

    fn glob_node() -> TemplateNode {
        TemplateNode::MarkdownFile(MarkdownFileNode {
            path: "docs/*".to_string(),
            origin: None,
            heading_level: None,
            strip_h1: None,
            anchor: None,
            condition: None,
            is_glob: true,
        })
    }

    #[test]
    fn no_parent_heading_means_root_level() {
        let ast = vec![TemplateNode::text("plain text\n\n"), md_node()];
        let hc = detect_heading_context(&ast, 1);
        assert_eq!(hc.heading_level, 1);
        assert!(!hc.strip_h1);
    }

    #[test]
    fn nests_one_level_under_parent_heading() {
        let ast = vec![TemplateNode::text("## Section\n\n"), md_node()];
        let hc = detect_heading_context(&ast, 1);
        assert_eq!(hc.heading_level, 3);
        // a lone placeholder under a heading is a chain of one
        assert!(!hc.strip_h1);
    }

    #[test]
    fn separating_heading_breaks_the_chain() {
        let ast = vec![
            TemplateNode::text("## A\n\n"),
            md_node(),
            TemplateNode::text("\n\n## B\n\n"),
            md_node(),
        ];
        let hc = detect_heading_context(&ast, 1);
        assert!(!hc.continuous_chain);
        assert!(hc.strip_h1);
    }

    #[test]
    fn adjacent_placeholders_form_a_chain() {
        let ast = vec![
            TemplateNode::text("## Docs\n\n"),
            md_node(),
            TemplateNode::text("\n"),
            md_node(),
        ];
        let hc = detect_heading_context(&ast, 1);
        assert!(hc.continuous_chain);
        assert!(!hc.strip_h1);
        assert_eq!(hc.heading_level, 3);
    }

    #[test]
    fn placeholder_inside_heading_inherits_its_level() {
        let ast = vec![TemplateNode::text("### "), md_node(), TemplateNode::text("\n")];
        let hc = detect_heading_context(&ast, 1);
        assert!(hc.inside_heading);
        assert_eq!(hc.heading_level, 3);
        assert!(!hc.strip_h1);
    }

    #[test]
    fn horizontal_rule_isolates_and_resets() {
        let ast = vec![TemplateNode::text("## Section\n\n---\n\n"), md_node()];
        let hc = detect_heading_context(&ast, 1);
        assert_eq!(hc.heading_level, 1);
        assert!(!hc.strip_h1);
    }

    #[test]
    fn glob_placeholders_always_chain() {
        let ast = vec![
            TemplateNode::text("## Docs\n\n"),
            glob_node(),
            TemplateNode::text("\n\n## Next\n"),
        ];
        let hc = detect_heading_context(&ast, 1);
        assert!(hc.continuous_chain);
        assert!(!hc.strip_h1);
    }
}
