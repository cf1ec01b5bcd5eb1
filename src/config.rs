//! Tag-set and mode-set configuration.
//!
//! Supplied by the host as YAML (see `AdaptiveConfig::from_yaml`). Tag sets
//! are families of mutually exclusive tags consulted by `TAGSET:...`
//! conditions; mode sets are named presets that activate tags and override
//! option values inside `{% mode %}` blocks.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;

/// Option projection of the currently active modes.
pub type ModeOptions = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagSet {
    #[serde(default)]
    pub tags: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagsConfig {
    #[serde(default)]
    pub tag_sets: BTreeMap<String, TagSet>,
    #[serde(default)]
    pub global_tags: BTreeMap<String, Value>,
}

impl TagsConfig {
    /// Family map for the condition evaluator: each tag set by name, plus
    /// the global tags as the pseudo-family `"global"`.
    pub fn tagset_families(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut families: BTreeMap<String, BTreeSet<String>> = self
            .tag_sets
            .iter()
            .map(|(name, set)| (name.clone(), set.tags.keys().cloned().collect()))
            .collect();
        if !self.global_tags.is_empty() {
            families.insert(
                "global".to_string(),
                self.global_tags.keys().cloned().collect(),
            );
        }
        families
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModeInfo {
    /// Tags activated while the mode is in effect.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Option overrides contributed by the mode.
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModeSet {
    #[serde(default)]
    pub modes: BTreeMap<String, ModeInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModesConfig {
    #[serde(default)]
    pub mode_sets: BTreeMap<String, ModeSet>,
}

impl ModesConfig {
    pub fn mode_info(&self, modeset: &str, mode: &str) -> Option<&ModeInfo> {
        self.mode_sets.get(modeset)?.modes.get(mode)
    }

    /// Merged option projection of `active` (modeset name → mode name).
    /// Modesets merge in sorted name order; later keys override earlier
    /// ones, which keeps the projection deterministic for any activation
    /// history.
    pub fn merge_options(&self, active: &BTreeMap<String, String>) -> ModeOptions {
        let mut merged = ModeOptions::new();
        for (modeset, mode) in active {
            if let Some(info) = self.mode_info(modeset, mode) {
                for (key, value) in &info.options {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        merged
    }
}

/// The full adaptive configuration the host supplies to a rendering.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdaptiveConfig {
    #[serde(default)]
    pub tags: TagsConfig,
    #[serde(default)]
    pub modes: ModesConfig,
}

impl AdaptiveConfig {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        Self::from_yaml(&text).map_err(|e| format!("invalid config {}: {}", path.display(), e))
    }
}
