//! Custom rule definitions and frame/rule bindings loaded from
//! `.warden/rules.yaml`.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::types::{OnFail, Severity};

/// Relative path of the rules file
pub const RULES_PATH: &str = ".warden/rules.yaml";

/// A custom validation rule. `pattern` is a regex applied line-wise to
/// analyzable files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

/// Pre/post rule hooks and failure policy bound to one frame
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FrameRuleBinding {
    pub pre_rules: Vec<String>,
    pub post_rules: Vec<String>,
    pub on_fail: OnFail,
}

/// Full contents of `.warden/rules.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RulesFile {
    /// Per-frame rule hook bindings keyed by frame id
    pub frame_rules: HashMap<String, FrameRuleBinding>,
    /// Custom rule definitions
    pub rules: Vec<Rule>,
    /// Rule ids applied as pre-rules to every frame
    pub global_rules: Vec<String>,
}

impl RulesFile {
    /// Load rules from `<root>/.warden/rules.yaml`; a missing file yields
    /// the empty rule set.
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let path = root.join(RULES_PATH);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read rules file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse rules file: {}", path.display()))
    }

    /// Look up a rule by id
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Binding for a frame, or the default (no hooks, `on_fail: continue`)
    pub fn binding(&self, frame_id: &str) -> FrameRuleBinding {
        self.frame_rules.get(frame_id).cloned().unwrap_or_default()
    }

    /// Resolve the pre-rules for a frame: global rules first, then the
    /// frame's own bindings. Unknown ids are dropped here; validation
    /// reported them already.
    pub fn pre_rules_for(&self, frame_id: &str) -> Vec<&Rule> {
        let binding = self.frame_rules.get(frame_id);
        self.global_rules
            .iter()
            .chain(binding.iter().flat_map(|b| b.pre_rules.iter()))
            .filter_map(|id| self.rule(id))
            .filter(|r| r.enabled)
            .collect()
    }

    /// Resolve the post-rules for a frame
    pub fn post_rules_for(&self, frame_id: &str) -> Vec<&Rule> {
        self.frame_rules
            .get(frame_id)
            .iter()
            .flat_map(|b| b.post_rules.iter())
            .filter_map(|id| self.rule(id))
            .filter(|r| r.enabled)
            .collect()
    }
}

/// A suppression rule from project config. `rule` is a segment-wise glob
/// over `frame_id:rule_id:target` keys; `files` optionally restricts scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressionRule {
    pub rule: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
