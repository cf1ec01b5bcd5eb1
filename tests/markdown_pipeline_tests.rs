//! Integration tests for the Markdown adapter pipeline.

use lg::markdown::model::{
    MarkdownDropCfg, MarkerRule, PlaceholderMode, PlaceholderPolicy,
};
use lg::markdown::{
    normalize_markdown, parse_markdown, process_markdown, slugify_github, MarkdownCfg,
    MarkdownKeepCfg, MatchKind, SectionMatch, SectionRule,
};
use rstest::rstest;

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
fn strip_h1_with_no_h1_leaves_the_file_unchanged() {
    let input = "## Only H2\n\nbody\n";
    let (out, meta) = normalize_markdown(input, None, true, 1, false);
    assert_eq!(out, input);
    assert!(!meta.removed_h1);
}

#[test]
fn minimum_already_at_target_is_unchanged() {
    let input = "### A\n\n#### B\n";
    let (out, meta) = normalize_markdown(input, Some(3), false, 1, false);
    assert_eq!(out, input);
    assert!(!meta.shifted);
}

#[test]
fn shift_down_is_possible() {
    let (out, _) = normalize_markdown("### Deep\n", Some(1), false, 1, false);
    assert_eq!(out, "# Deep\n");
}

#[rstest]
#[case("FAQ: Common Questions", "faq-common-questions")]
#[case("Hello, World!", "hello-world")]
#[case("Émigré Café", "emigre-cafe")]
#[case("a  b\tc", "a-b-c")]
fn github_slugs(#[case] title: &str, #[case] expected: &str) {
    assert_eq!(slugify_github(title), expected);
}

#[test]
fn drop_removes_section_with_placeholder() {
    let cfg = MarkdownCfg {
        drop: Some(MarkdownDropCfg {
            sections: vec![slug_rule("internals")],
            markers: vec![],
            frontmatter: true,
            placeholder: PlaceholderPolicy {
                mode: PlaceholderMode::Summary,
                template: Some("> omitted: {title} ({lines} lines)".to_string()),
            },
        }),
        ..MarkdownCfg::default()
    };
    let input = "# Doc\n\n## Internals\n\nsecret\n\n## Public\n\nok\n";
    let (out, meta) = process_markdown(input, &cfg, 1, false).unwrap();
    assert!(!out.contains("secret"));
    assert!(out.contains("> omitted: Internals (4 lines)"), "{}", out);
    assert!(out.contains("ok"));
    assert_eq!(meta["md.placeholders"], 1);
}

#[test]
fn drop_frontmatter_by_default() {
    let cfg = MarkdownCfg {
        drop: Some(MarkdownDropCfg::default()),
        ..MarkdownCfg::default()
    };
    let input = "---\ntitle: x\n---\n\n# Doc\nbody\n";
    let (out, _) = process_markdown(input, &cfg, 1, false).unwrap();
    assert!(!out.contains("title: x"));
    assert!(out.starts_with("# Doc"), "{}", out);
}

#[test]
fn marker_rules_cut_delimited_ranges() {
    let cfg = MarkdownCfg {
        drop: Some(MarkdownDropCfg {
            sections: vec![],
            markers: vec![MarkerRule {
                start: "<!-- private -->".to_string(),
                end: "<!-- /private -->".to_string(),
                include_markers: true,
                reason: None,
                placeholder: None,
            }],
            frontmatter: false,
            placeholder: PlaceholderPolicy::default(),
        }),
        ..MarkdownCfg::default()
    };
    let input = "keep\n<!-- private -->\nhidden\n<!-- /private -->\nalso keep\n";
    let (out, _) = process_markdown(input, &cfg, 1, false).unwrap();
    assert_eq!(out, "keep\nalso keep\n");
}

#[test]
fn keep_with_regex_matcher() {
    let cfg = MarkdownCfg {
        keep: Some(MarkdownKeepCfg {
            sections: vec![SectionRule {
                matcher: Some(SectionMatch {
                    kind: MatchKind::Regex,
                    pattern: "^us".to_string(),
                    flags: Some("i".to_string()),
                }),
                ..SectionRule::default()
            }],
            frontmatter: false,
        }),
        ..MarkdownCfg::default()
    };
    let input = "# Doc\n\n## Usage\nrun\n\n## Other\nno\n";
    let (out, _) = process_markdown(input, &cfg, 1, false).unwrap();
    assert!(out.contains("run"));
    assert!(!out.contains("no\n"), "{}", out);
}

#[test]
fn fenced_code_is_never_touched() {
    let input = "# A\n\n```\n# not a heading\n---\n```\n";
    let (out, _) = normalize_markdown(input, Some(2), false, 1, false);
    assert!(out.contains("\n# not a heading\n"), "{}", out);
    assert!(out.starts_with("## A"));
}

#[test]
fn parser_reports_heading_tree_and_frontmatter() {
    let doc = parse_markdown("---\nk: v\n---\n# T\n## S\nx\n");
    assert_eq!(doc.frontmatter_range, Some((0, 3)));
    assert_eq!(doc.headings.len(), 2);
    assert_eq!(doc.headings[1].parents, vec![0]);
    assert_eq!(doc.headings[1].slug, "s");
}
