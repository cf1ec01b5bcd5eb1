//! Section and marker selection for keep/drop rules.

use regex::RegexBuilder;

use super::model::{HeadingNode, MarkerRule, MatchKind, ParsedDoc, SectionRule};
use super::slug::slugify_github;

fn matcher_hits(rule: &SectionRule, heading: &HeadingNode) -> Result<bool, String> {
    let Some(matcher) = &rule.matcher else {
        return Ok(true);
    };
    match matcher.kind {
        MatchKind::Text => Ok(heading.title == matcher.pattern),
        MatchKind::Slug => Ok(slugify_github(&heading.title) == matcher.pattern),
        MatchKind::Regex => {
            let flags = matcher.flags.as_deref().unwrap_or("");
            let regex = RegexBuilder::new(&matcher.pattern)
                .case_insensitive(flags.contains('i'))
                .multi_line(flags.contains('m'))
                .dot_matches_new_line(flags.contains('s'))
                .build()
                .map_err(|e| format!("invalid section regex '{}': {}", matcher.pattern, e))?;
            Ok(regex.is_match(&heading.title))
        }
    }
}

fn level_hits(rule: &SectionRule, heading: &HeadingNode) -> bool {
    if let Some(exact) = rule.level_exact {
        if heading.level != exact {
            return false;
        }
    }
    if let Some(at_most) = rule.level_at_most {
        if heading.level > at_most {
            return false;
        }
    }
    if let Some(at_least) = rule.level_at_least {
        if heading.level < at_least {
            return false;
        }
    }
    true
}

/// Ancestor-path check against exact heading texts. The path may describe
/// either the ancestors alone or the ancestors plus the heading itself.
fn path_hits(path: Option<&[String]>, heading: &HeadingNode, all: &[HeadingNode]) -> bool {
    let Some(path) = path else {
        return true;
    };
    if path.is_empty() {
        return true;
    }

    let parent_titles: Vec<&str> = heading
        .parents
        .iter()
        .map(|&i| all[i].title.as_str())
        .collect();

    let suffix_matches = |needle: &[String], hay: &[&str]| {
        needle.len() <= hay.len()
            && hay[hay.len() - needle.len()..]
                .iter()
                .zip(needle)
                .all(|(a, b)| *a == b)
    };

    if suffix_matches(path, &parent_titles) {
        return true;
    }
    if path.last().map(String::as_str) == Some(heading.title.as_str()) {
        let ancestors = &path[..path.len() - 1];
        if suffix_matches(ancestors, &parent_titles) {
            return true;
        }
    }
    false
}

/// Heading subtrees selected by `rules`, as `(start, end_excl, rule, heading)`.
pub fn select_section_intervals<'a>(
    doc: &'a ParsedDoc,
    rules: &'a [SectionRule],
) -> Result<Vec<(usize, usize, &'a SectionRule, &'a HeadingNode)>, String> {
    let mut out = Vec::new();
    for rule in rules {
        if rule.matcher.is_none() && rule.path.is_none() {
            // ill-formed rule, nothing to select
            continue;
        }
        for heading in &doc.headings {
            if !matcher_hits(rule, heading)? {
                continue;
            }
            if !path_hits(rule.path.as_deref(), heading, &doc.headings) {
                continue;
            }
            if !level_hits(rule, heading) {
                continue;
            }
            out.push((heading.start_line, heading.end_line_excl, rule, heading));
        }
    }
    Ok(out)
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn find_line(lines: &[String], target: &str, start: usize) -> Option<usize> {
    let stripped = target.trim();
    let normalized = normalize_ws(target);
    (start..lines.len())
        .find(|&j| lines[j] == target)
        .or_else(|| (start..lines.len()).find(|&j| lines[j].trim() == stripped))
        .or_else(|| (start..lines.len()).find(|&j| normalize_ws(&lines[j]) == normalized))
}

/// Non-overlapping start/end marker pairs per rule, in document order. A
/// start without a matching end extends to the end of the file.
pub fn select_marker_intervals<'a>(
    lines: &[String],
    markers: &'a [MarkerRule],
) -> Vec<(usize, usize, &'a MarkerRule)> {
    let mut out = Vec::new();
    let n = lines.len();
    for rule in markers {
        let mut i = 0;
        while i < n {
            let Some(s) = find_line(lines, &rule.start, i) else {
                break;
            };
            let end_excl = match find_line(lines, &rule.end, s + 1) {
                Some(e) => e + 1,
                None => n,
            };
            if rule.include_markers {
                out.push((s, end_excl, rule));
            } else {
                let s0 = s + 1;
                let e0 = if end_excl > s + 1 { end_excl - 1 } else { s + 1 };
                out.push((s0, e0, rule));
            }
            i = end_excl;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::model::SectionMatch;
    use crate::markdown::parse_markdown;

    fn slug_rule(pattern: &str) -> SectionRule {
        SectionRule {
            matcher: Some(SectionMatch {
                kind: MatchKind::Slug,
                pattern: pattern.to_string(),
                flags: None,
            }),
            ..SectionRule::default()
        }
    }

    #[test]
    fn selects_subtree_by_slug() {
        let doc = parse_markdown("# Top\n## Getting Started\nbody\n## Other\n");
        let rules = vec![slug_rule("getting-started")];
        let hits = select_section_intervals(&doc, &rules).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].0, hits[0].1), (1, 3));
    }

    #[test]
    fn path_constrains_by_ancestors() {
        let doc = parse_markdown("# A\n## Setup\nx\n# B\n## Setup\ny\n");
        let rule = SectionRule {
            matcher: Some(SectionMatch {
                kind: MatchKind::Text,
                pattern: "Setup".to_string(),
                flags: None,
            }),
            path: Some(vec!["B".to_string()]),
            ..SectionRule::default()
        };
        let rules = [rule];
        let hits = select_section_intervals(&doc, &rules).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].3.start_line, 4);
    }

    #[test]
    fn marker_pairs_respect_include_flag() {
        let lines: Vec<String> = ["keep", "<!-- cut -->", "gone", "<!-- end -->", "keep"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rule = MarkerRule {
            start: "<!-- cut -->".to_string(),
            end: "<!-- end -->".to_string(),
            include_markers: false,
            reason: None,
            placeholder: None,
        };
        let hits = select_marker_intervals(&lines, std::slice::from_ref(&rule));
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].0, hits[0].1), (2, 3));
    }

    #[test]
    fn marker_without_end_runs_to_eof() {
        let lines: Vec<String> = ["a", "<!-- cut -->", "b"].iter().map(|s| s.to_string()).collect();
        let rule = MarkerRule {
            start: "<!-- cut -->".to_string(),
            end: "<!-- never -->".to_string(),
            include_markers: true,
            reason: None,
            placeholder: None,
        };
        let hits = select_marker_intervals(&lines, std::slice::from_ref(&rule));
        assert_eq!((hits[0].0, hits[0].1), (1, 3));
    }
}
