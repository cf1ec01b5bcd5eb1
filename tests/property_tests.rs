//! Property tests for the pipeline invariants.

use proptest::prelude::*;

use lg::conditions::{evaluate, ConditionParser};
use lg::run_context::{ConditionContext, RunContext};
use lg::template::TemplateEngine;

fn engine() -> TemplateEngine<'static> {
    TemplateEngine::new(RunContext::new("/tmp/repo".into())).unwrap()
}

/// Text with none of the DSL openers; `}`, lone `$`, `{`, `%`, `#` are
/// exercised deliberately since they are literal outside contexts.
fn plain_text() -> impl Strategy<Value = String> {
    proptest::string::string_regex(
        r"([A-Za-z0-9 \t\n.,;:!?'()\[\]*_@-]|\}|\$[^{]|\{[^%#]|%[^}]|#[^}])*",
    )
    .unwrap()
    .prop_filter("no accidental openers or closers", |s| {
        !s.contains("${") && !s.contains("{%") && !s.contains("{#") && !s.contains("%}")
            && !s.contains("#}")
    })
}

proptest! {
    /// Non-DSL substrate survives lexing and rendering byte for byte.
    #[test]
    fn plain_text_round_trips(text in plain_text()) {
        let engine = engine();
        let rendered = engine.render_text(&text).unwrap();
        prop_assert_eq!(rendered, text);
    }

    /// Rendering with an empty tag set strips every DSL construct and
    /// leaves no markers behind.
    #[test]
    fn rendered_output_contains_no_markers(a in plain_text(), b in plain_text()) {
        let combined = format!("{}{}", a, b);
        // fragment boundaries must not form markers on their own
        prop_assume!(!combined.contains("${") && !combined.contains("{%") && !combined.contains("{#"));

        let engine = engine();
        let template = format!("{}{{% if tag:never %}}inner{{% endif %}}{}{{# gone #}}", a, b);
        let rendered = engine.render_text(&template).unwrap();
        prop_assert_eq!(&rendered, &combined);
        let has_percent_marker = rendered.contains("{%");
        let has_hash_marker = rendered.contains("{#");
        prop_assert!(!has_percent_marker);
        prop_assert!(!has_hash_marker);
    }
}

fn tag_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_-]{0,8}")
        .unwrap()
        // an identifier spelled exactly like a keyword is promoted to
        // keyword kind and is not a valid name
        .prop_filter("not a keyword", |name| {
            !matches!(name.as_str(), "tag" | "scope" | "task")
        })
}

/// Well-formed condition source strings, built from the grammar.
fn condition_source() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        tag_name().prop_map(|t| format!("tag:{}", t)),
        (tag_name(), tag_name()).prop_map(|(s, t)| format!("TAGSET:{}:{}", s, t)),
        Just("scope:local".to_string()),
        Just("scope:parent".to_string()),
        Just("task".to_string()),
    ];
    leaf.prop_recursive(3, 24, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|c| format!("NOT {}", c)),
            inner.clone().prop_map(|c| format!("({})", c)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{} AND {}", a, b)),
            (inner.clone(), inner).prop_map(|(a, b)| format!("{} OR {}", a, b)),
        ]
    })
}

proptest! {
    /// Every grammatical condition parses, and its display form reparses
    /// to the same tree.
    #[test]
    fn grammatical_conditions_parse(source in condition_source()) {
        let parsed = ConditionParser::parse(&source).unwrap();
        let reparsed = ConditionParser::parse(&parsed.to_string()).unwrap();
        prop_assert_eq!(parsed, reparsed);
    }

    /// Evaluation is pure: the same condition against the same context
    /// yields the same answer twice.
    #[test]
    fn evaluation_is_deterministic(source in condition_source(), tags in proptest::collection::btree_set(tag_name(), 0..4)) {
        let condition = ConditionParser::parse(&source).unwrap();
        let context = ConditionContext {
            active_tags: tags,
            tagsets: Default::default(),
            origin: "self".to_string(),
            task_provided: false,
        };
        prop_assert_eq!(evaluate(&condition, &context), evaluate(&condition, &context));
    }
}
