//! Rendering state.
//!
//! Tracks the current origin, the active tag set, the active mode map and
//! its merged option projection. `{% mode %}` blocks and include scopes
//! push snapshots onto a state stack; every entry is paired with an exit on
//! all paths, including errors.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::warn;

use crate::conditions::{evaluate, Condition, ConditionParser};
use crate::config::ModeOptions;
use crate::run_context::{ConditionContext, RunContext, SELF_ORIGIN};
use crate::sections::SectionCfg;

use super::RenderError;

/// Snapshot of the mutable rendering state.
#[derive(Debug, Clone)]
pub struct TemplateState {
    pub origin: String,
    pub mode_options: ModeOptions,
    pub active_tags: BTreeSet<String>,
    /// modeset name → active mode name.
    pub active_modes: BTreeMap<String, String>,
}

/// Rendering context shared by the processor and the plugins.
pub struct TemplateContext {
    pub run_ctx: RunContext,
    state: TemplateState,
    state_stack: Vec<TemplateState>,
    virtual_section: Option<SectionCfg>,
    virtual_counter: usize,
    tagset_families: BTreeMap<String, BTreeSet<String>>,
    parsed_conditions: HashMap<String, Condition>,
    evaluated: HashMap<(String, String), bool>,
}

impl TemplateContext {
    pub fn new(run_ctx: RunContext) -> Self {
        let mut active_tags = run_ctx.options.extra_tags.clone();
        for (modeset, mode) in &run_ctx.options.modes {
            if let Some(info) = run_ctx.adaptive.modes.mode_info(modeset, mode) {
                active_tags.extend(info.tags.iter().cloned());
            }
        }
        let mode_options = run_ctx.adaptive.modes.merge_options(&run_ctx.options.modes);
        let tagset_families = run_ctx.adaptive.tags.tagset_families();

        let state = TemplateState {
            origin: SELF_ORIGIN.to_string(),
            mode_options,
            active_tags,
            active_modes: run_ctx.options.modes.clone(),
        };

        Self {
            run_ctx,
            state,
            state_stack: Vec::new(),
            virtual_section: None,
            virtual_counter: 0,
            tagset_families,
            parsed_conditions: HashMap::new(),
            evaluated: HashMap::new(),
        }
    }

    pub fn state(&self) -> &TemplateState {
        &self.state
    }

    pub fn origin(&self) -> &str {
        &self.state.origin
    }

    pub fn active_tags(&self) -> &BTreeSet<String> {
        &self.state.active_tags
    }

    pub fn mode_options(&self) -> &ModeOptions {
        &self.state.mode_options
    }

    pub fn stack_depth(&self) -> usize {
        self.state_stack.len()
    }

    /// Enters a `{% mode modeset:mode %}` block: saves the state, records
    /// the mode, unions its tags, and recomputes the merged options.
    pub fn enter_mode_block(&mut self, modeset: &str, mode: &str) -> Result<(), RenderError> {
        let modes_config = &self.run_ctx.adaptive.modes;
        let Some(mode_set) = modes_config.mode_sets.get(modeset) else {
            return Err(RenderError::new(format!("unknown mode set '{}'", modeset)));
        };
        let Some(info) = mode_set.modes.get(mode) else {
            let available: Vec<&str> = mode_set.modes.keys().map(String::as_str).collect();
            return Err(RenderError::new(format!(
                "unknown mode '{}' in mode set '{}', available: {}",
                mode,
                modeset,
                available.join(", ")
            )));
        };
        let tags = info.tags.clone();

        self.state_stack.push(self.state.clone());
        self.state
            .active_modes
            .insert(modeset.to_string(), mode.to_string());
        self.state.active_tags.extend(tags);
        self.state.mode_options = self
            .run_ctx
            .adaptive
            .modes
            .merge_options(&self.state.active_modes);
        Ok(())
    }

    pub fn exit_mode_block(&mut self) -> Result<(), RenderError> {
        self.pop_state("no mode block to exit (state stack is empty)")
    }

    /// Enters the scope of an included template: only the origin changes.
    pub fn enter_include_scope(&mut self, origin: &str) {
        self.state_stack.push(self.state.clone());
        self.state.origin = origin.to_string();
    }

    pub fn exit_include_scope(&mut self) -> Result<(), RenderError> {
        self.pop_state("no include scope to exit (state stack is empty)")
    }

    fn pop_state(&mut self, message: &str) -> Result<(), RenderError> {
        match self.state_stack.pop() {
            Some(state) => {
                self.state = state;
                Ok(())
            }
            None => Err(RenderError::new(message)),
        }
    }

    /// Emits a warning when block-entering constructs were left unclosed.
    pub fn check_balanced(&self) {
        if !self.state_stack.is_empty() {
            warn!(
                "rendering finished with {} unclosed scope(s); missing {{% endmode %}}?",
                self.state_stack.len()
            );
        }
    }

    pub fn set_virtual_section(&mut self, cfg: SectionCfg) {
        self.virtual_section = Some(cfg);
    }

    pub fn clear_virtual_section(&mut self) {
        self.virtual_section = None;
    }

    pub fn virtual_section(&self) -> Option<&SectionCfg> {
        self.virtual_section.as_ref()
    }

    /// Unique name for the next virtual section of this rendering.
    pub fn next_virtual_name(&mut self) -> String {
        self.virtual_counter += 1;
        format!("_virtual_{}", self.virtual_counter)
    }

    fn condition_context(&self) -> ConditionContext {
        ConditionContext {
            active_tags: self.state.active_tags.clone(),
            tagsets: self.tagset_families.clone(),
            origin: self.state.origin.clone(),
            task_provided: !self.run_ctx.options.task_text.trim().is_empty(),
        }
    }

    /// Evaluates a pre-parsed condition against the current state.
    pub fn evaluate_condition(&self, condition: &Condition) -> bool {
        evaluate(condition, &self.condition_context())
    }

    /// Parses and evaluates condition source text, memoizing both the
    /// parse and the result. The result key includes a fingerprint of the
    /// tags, modes, and origin so state changes invalidate naturally.
    pub fn evaluate_condition_text(&mut self, text: &str) -> Result<bool, RenderError> {
        let fingerprint = self.state_fingerprint();
        let key = (text.to_string(), fingerprint);
        if let Some(&cached) = self.evaluated.get(&key) {
            return Ok(cached);
        }

        let condition = match self.parsed_conditions.get(text) {
            Some(condition) => condition.clone(),
            None => {
                let condition = ConditionParser::parse(text)
                    .map_err(|err| RenderError::new(format!("invalid condition: {}", err)))?;
                self.parsed_conditions
                    .insert(text.to_string(), condition.clone());
                condition
            }
        };

        let result = self.evaluate_condition(&condition);
        self.evaluated.insert(key, result);
        Ok(result)
    }

    /// Order-stable fingerprint of the evaluation-relevant state.
    fn state_fingerprint(&self) -> String {
        let tags: Vec<&str> = self.state.active_tags.iter().map(String::as_str).collect();
        let modes: Vec<String> = self
            .state
            .active_modes
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}|{}|{}", tags.join(","), modes.join(","), self.state.origin)
    }
}
