//! Short-circuit evaluator for condition expressions.

use super::model::{Condition, ScopeKind};
use super::parser::ConditionParser;
use super::ConditionError;

/// What the evaluator can ask of its environment.
///
/// The rendering state implements this; tests may instrument it to observe
/// evaluation order.
pub trait ConditionScope {
    fn is_tag_active(&self, name: &str) -> bool;

    /// Disjoint-or-selected semantics: true iff no tag of the family is
    /// active, or the named tag is active.
    fn is_tagset_met(&self, set_name: &str, tag_name: &str) -> bool;

    fn is_scope(&self, scope: ScopeKind) -> bool;

    fn is_task_provided(&self) -> bool;
}

/// Evaluates a parsed condition.
///
/// `AND` and `OR` short-circuit: the right operand is not visited when the
/// left operand already decides the result. Evaluation never mutates the
/// scope.
pub fn evaluate(condition: &Condition, scope: &dyn ConditionScope) -> bool {
    match condition {
        Condition::Tag { name } => scope.is_tag_active(name),
        Condition::TagSet { set_name, tag_name } => scope.is_tagset_met(set_name, tag_name),
        Condition::Scope { scope: kind } => scope.is_scope(*kind),
        Condition::Task => scope.is_task_provided(),
        Condition::Group { inner } => evaluate(inner, scope),
        Condition::Not { inner } => !evaluate(inner, scope),
        Condition::And { left, right } => evaluate(left, scope) && evaluate(right, scope),
        Condition::Or { left, right } => evaluate(left, scope) || evaluate(right, scope),
    }
}

/// Parses and evaluates a condition from its source text.
pub fn evaluate_str(text: &str, scope: &dyn ConditionScope) -> Result<bool, ConditionError> {
    let condition = ConditionParser::parse(text)?;
    Ok(evaluate(&condition, scope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};

    struct FakeScope {
        tags: BTreeSet<String>,
        tagsets: BTreeMap<String, BTreeSet<String>>,
        local: bool,
        task: bool,
        probed: RefCell<Vec<String>>,
    }

    impl FakeScope {
        fn with_tags(tags: &[&str]) -> Self {
            Self {
                tags: tags.iter().map(|t| t.to_string()).collect(),
                tagsets: BTreeMap::new(),
                local: true,
                task: false,
                probed: RefCell::new(Vec::new()),
            }
        }
    }

    impl ConditionScope for FakeScope {
        fn is_tag_active(&self, name: &str) -> bool {
            self.probed.borrow_mut().push(name.to_string());
            self.tags.contains(name)
        }

        fn is_tagset_met(&self, set_name: &str, tag_name: &str) -> bool {
            let members = self.tagsets.get(set_name).cloned().unwrap_or_default();
            let active_in_set = members.intersection(&self.tags).next().is_some();
            !active_in_set || self.tags.contains(tag_name)
        }

        fn is_scope(&self, scope: ScopeKind) -> bool {
            match scope {
                ScopeKind::Local => self.local,
                ScopeKind::Parent => !self.local,
            }
        }

        fn is_task_provided(&self) -> bool {
            self.task
        }
    }

    #[test]
    fn and_short_circuits_on_false_left() {
        let scope = FakeScope::with_tags(&[]);
        assert!(!evaluate_str("tag:a AND tag:b", &scope).unwrap());
        assert_eq!(*scope.probed.borrow(), vec!["a"]);
    }

    #[test]
    fn or_short_circuits_on_true_left() {
        let scope = FakeScope::with_tags(&["a"]);
        assert!(evaluate_str("tag:a OR tag:b", &scope).unwrap());
        assert_eq!(*scope.probed.borrow(), vec!["a"]);
    }

    #[test]
    fn tagset_is_true_when_family_dormant() {
        let mut scope = FakeScope::with_tags(&["other"]);
        scope.tagsets.insert(
            "lang".to_string(),
            ["rust", "python"].iter().map(|s| s.to_string()).collect(),
        );
        assert!(evaluate_str("TAGSET:lang:rust", &scope).unwrap());
    }

    #[test]
    fn tagset_selects_only_active_member() {
        let mut scope = FakeScope::with_tags(&["python"]);
        scope.tagsets.insert(
            "lang".to_string(),
            ["rust", "python"].iter().map(|s| s.to_string()).collect(),
        );
        assert!(evaluate_str("TAGSET:lang:python", &scope).unwrap());
        assert!(!evaluate_str("TAGSET:lang:rust", &scope).unwrap());
    }

    #[test]
    fn task_condition_reads_task_presence() {
        let mut scope = FakeScope::with_tags(&[]);
        assert!(!evaluate_str("task", &scope).unwrap());
        scope.task = true;
        assert!(evaluate_str("task", &scope).unwrap());
    }
}
