//! Host-supplied inputs for one rendering.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::conditions::{ConditionScope, ScopeKind};
use crate::config::AdaptiveConfig;

/// The origin naming the repository's own scope.
pub const SELF_ORIGIN: &str = "self";

/// Open record of per-run options.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Task text supplied by the host; empty means "no task".
    pub task_text: String,
    /// Tags activated for the whole rendering.
    pub extra_tags: BTreeSet<String>,
    /// Initially selected modes (modeset name → mode name).
    pub modes: BTreeMap<String, String>,
}

/// Everything the engine needs from the host to render one context.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Absolute repository root.
    pub root: PathBuf,
    pub options: RenderOptions,
    pub adaptive: AdaptiveConfig,
}

impl RunContext {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }
}

/// Snapshot of the state a condition is evaluated against.
#[derive(Debug, Clone, Default)]
pub struct ConditionContext {
    pub active_tags: BTreeSet<String>,
    pub tagsets: BTreeMap<String, BTreeSet<String>>,
    pub origin: String,
    pub task_provided: bool,
}

impl ConditionScope for ConditionContext {
    fn is_tag_active(&self, name: &str) -> bool {
        self.active_tags.contains(name)
    }

    fn is_tagset_met(&self, set_name: &str, tag_name: &str) -> bool {
        let Some(members) = self.tagsets.get(set_name) else {
            // unknown family: no member is active
            return true;
        };
        let any_active = members.iter().any(|tag| self.active_tags.contains(tag));
        !any_active || self.active_tags.contains(tag_name)
    }

    fn is_scope(&self, scope: ScopeKind) -> bool {
        let local = self.origin == SELF_ORIGIN;
        match scope {
            ScopeKind::Local => local,
            ScopeKind::Parent => !local,
        }
    }

    fn is_task_provided(&self) -> bool {
        self.task_provided
    }
}
