//! AST for condition expressions.

use serde::Serialize;

/// Scope selector in a `scope:...` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// The rendering file belongs to the repository's own scope (`"self"`).
    Local,
    /// The rendering file was pulled in from a nested scope.
    Parent,
}

impl ScopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Local => "local",
            ScopeKind::Parent => "parent",
        }
    }
}

/// A parsed condition expression.
///
/// `Group` only exists to preserve explicit parentheses in the string form;
/// it evaluates to its inner condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// `tag:NAME` - true iff NAME is in the active tag set.
    Tag { name: String },
    /// `TAGSET:SET:NAME` - true iff no tag of SET is active, or NAME is.
    TagSet { set_name: String, tag_name: String },
    /// `scope:local` / `scope:parent`.
    Scope { scope: ScopeKind },
    /// `task` - true iff a non-empty task text was supplied.
    Task,
    /// Parenthesized sub-expression.
    Group { inner: Box<Condition> },
    /// `NOT expr`.
    Not { inner: Box<Condition> },
    /// `left AND right`.
    And {
        left: Box<Condition>,
        right: Box<Condition>,
    },
    /// `left OR right`.
    Or {
        left: Box<Condition>,
        right: Box<Condition>,
    },
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Tag { name } => write!(f, "tag:{}", name),
            Condition::TagSet { set_name, tag_name } => {
                write!(f, "TAGSET:{}:{}", set_name, tag_name)
            }
            Condition::Scope { scope } => write!(f, "scope:{}", scope.as_str()),
            Condition::Task => write!(f, "task"),
            Condition::Group { inner } => write!(f, "({})", inner),
            Condition::Not { inner } => write!(f, "NOT {}", inner),
            Condition::And { left, right } => write!(f, "{} AND {}", left, right),
            Condition::Or { left, right } => write!(f, "{} OR {}", left, right),
        }
    }
}
