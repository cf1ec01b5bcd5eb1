//! Integration tests for the condition sub-language.

use std::collections::{BTreeMap, BTreeSet};

use rstest::rstest;

use lg::conditions::{evaluate_str, ConditionParser};
use lg::run_context::ConditionContext;

fn context_with(tags: &[&str]) -> ConditionContext {
    ConditionContext {
        active_tags: tags.iter().map(|t| t.to_string()).collect(),
        tagsets: BTreeMap::new(),
        origin: "self".to_string(),
        task_provided: false,
    }
}

fn context_with_tagsets(tags: &[&str], families: &[(&str, &[&str])]) -> ConditionContext {
    let mut context = context_with(tags);
    for (name, members) in families {
        context.tagsets.insert(
            name.to_string(),
            members.iter().map(|m| m.to_string()).collect::<BTreeSet<_>>(),
        );
    }
    context
}

#[rstest]
#[case("tag:python", true)]
#[case("tag:javascript", false)]
#[case("NOT tag:javascript", true)]
#[case("NOT NOT tag:python", true)]
#[case("tag:python AND tag:tests", true)]
#[case("tag:python AND tag:javascript", false)]
#[case("tag:python OR tag:javascript", true)]
#[case("tag:javascript OR tag:go", false)]
#[case("tag:javascript OR tag:go OR tag:python", true)]
#[case("(tag:javascript OR tag:python) AND tag:tests", true)]
#[case("NOT (tag:python AND tag:tests)", false)]
#[case("scope:local", true)]
#[case("scope:parent", false)]
#[case("task", false)]
fn evaluates_against_active_tags(#[case] source: &str, #[case] expected: bool) {
    let context = context_with(&["python", "tests", "minimal"]);
    assert_eq!(evaluate_str(source, &context).unwrap(), expected, "{}", source);
}

#[test]
fn tagset_is_disjoint_or_selected() {
    let context = context_with_tagsets(
        &["python", "tests"],
        &[
            ("language", &["python", "javascript", "typescript"]),
            ("feature", &["auth", "api", "ui"]),
            ("empty_set", &[]),
        ],
    );

    // the active member satisfies queries against its family
    assert!(evaluate_str("TAGSET:language:python", &context).unwrap());
    // other members of an activated family do not
    assert!(!evaluate_str("TAGSET:language:javascript", &context).unwrap());
    // a dormant family satisfies every query
    assert!(evaluate_str("TAGSET:feature:auth", &context).unwrap());
    assert!(evaluate_str("TAGSET:feature:api", &context).unwrap());
    // so does an empty or unknown family
    assert!(evaluate_str("TAGSET:empty_set:anything", &context).unwrap());
    assert!(evaluate_str("TAGSET:nonexistent:whatever", &context).unwrap());
}

#[test]
fn scope_conditions_follow_origin() {
    let mut context = context_with(&[]);
    context.origin = "apps/web".to_string();
    assert!(!evaluate_str("scope:local", &context).unwrap());
    assert!(evaluate_str("scope:parent", &context).unwrap());
}

#[test]
fn task_condition_follows_presence() {
    let mut context = context_with(&[]);
    context.task_provided = true;
    assert!(evaluate_str("task", &context).unwrap());
    assert!(evaluate_str("task AND scope:local", &context).unwrap());
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("tag:")]
#[case("tag python")]
#[case("(tag:a")]
#[case("tag:a AND")]
#[case("scope:everywhere")]
#[case("TAGSET:one")]
#[case("AND tag:a")]
fn rejects_malformed_expressions(#[case] source: &str) {
    assert!(ConditionParser::parse(source).is_err(), "{:?}", source);
}

#[test]
fn parse_errors_carry_positions() {
    let err = ConditionParser::parse("tag:a ? tag:b").unwrap_err();
    assert_eq!(err.position, 6);

    let err = ConditionParser::parse("scope:nowhere").unwrap_err();
    assert_eq!(err.position, 6);
}

#[test]
fn hyphenated_and_unicode_tag_names() {
    let context = context_with(&["multi-word-tag", "тест"]);
    assert!(evaluate_str("tag:multi-word-tag", &context).unwrap());
    assert!(evaluate_str("tag:тест", &context).unwrap());
}
