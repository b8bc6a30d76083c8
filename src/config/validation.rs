//! Configuration validation run before the pipeline starts.
//!
//! Errors abort the run (exit 2); warnings are logged and the run proceeds.

use serde::{Deserialize, Serialize};

use crate::config::{Config, RulesFile};
use crate::platform::PlatformRole;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Error,
            message: message.into(),
            field: Some(field.to_string()),
        });
    }

    pub fn warning(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Warning,
            message: message.into(),
            field: Some(field.to_string()),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
    }
}

/// Validate project configuration against the registered frame ids.
///
/// Platform type/role enum membership is enforced at deserialization time by
/// serde; what remains here are the cross-object checks.
pub fn validate_config(
    config: &Config,
    rules: &RulesFile,
    registered_frames: &[String],
) -> ValidationResult {
    let mut result = ValidationResult::default();

    // Contract validation needs at least one consumer and one provider
    let has_consumer = config
        .platforms
        .iter()
        .any(|p| matches!(p.role, PlatformRole::Consumer | PlatformRole::Both));
    let has_provider = config
        .platforms
        .iter()
        .any(|p| matches!(p.role, PlatformRole::Provider | PlatformRole::Both));
    if !config.platforms.is_empty() && !(has_consumer && has_provider) {
        result.warning(
            "platforms",
            "contract validation needs at least one consumer and one provider platform",
        );
    }

    // Every frame id referenced in frame_rules must exist
    for frame_id in rules.frame_rules.keys() {
        if !registered_frames.iter().any(|f| f == frame_id) {
            result.warning(
                "frame_rules",
                format!("frame_rules references unknown frame '{}'", frame_id),
            );
        }
    }

    // Suppression keys reference a frame id in their first segment
    for suppression in &config.suppressions {
        let frame_segment = suppression.rule.split(':').next().unwrap_or("");
        if frame_segment != "*" && !registered_frames.iter().any(|f| f == frame_segment) {
            result.warning(
                "suppressions",
                format!(
                    "suppression '{}' references unknown frame '{}'",
                    suppression.rule, frame_segment
                ),
            );
        }
        if suppression.rule.split(':').count() != 3 {
            result.error(
                "suppressions",
                format!(
                    "suppression '{}' must have the form frame:rule:target",
                    suppression.rule
                ),
            );
        }
    }

    // Every rule id referenced in pre/post hooks must be defined
    for (frame_id, binding) in &rules.frame_rules {
        for rule_id in binding.pre_rules.iter().chain(binding.post_rules.iter()) {
            if rules.rule(rule_id).is_none() {
                result.warning(
                    "frame_rules",
                    format!(
                        "frame '{}' references undefined rule '{}'",
                        frame_id, rule_id
                    ),
                );
            }
        }
    }
    for rule_id in &rules.global_rules {
        if rules.rule(rule_id).is_none() {
            result.warning(
                "global_rules",
                format!("global_rules references undefined rule '{}'", rule_id),
            );
        }
    }

    // Enabled frame ids must be registered
    for frame_id in &config.frames.enabled {
        if !registered_frames.iter().any(|f| f == frame_id) {
            result.error(
                "frames.enabled",
                format!("enabled frame '{}' is not registered", frame_id),
            );
        }
    }

    // Rule patterns must compile
    for rule in &rules.rules {
        if let Some(pattern) = &rule.pattern {
            if let Err(e) = regex::Regex::new(pattern) {
                result.error(
                    "rules",
                    format!("rule '{}' has an invalid pattern: {}", rule.id, e),
                );
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rules::FrameRuleBinding;

    fn frames() -> Vec<String> {
        vec!["security".to_string(), "orphan".to_string()]
    }

    #[test]
    fn empty_config_is_valid() {
        let result = validate_config(&Config::default(), &RulesFile::default(), &frames());
        assert!(!result.has_errors());
        assert!(result.issues.is_empty());
    }

    #[test]
    fn unknown_frame_in_bindings_is_a_warning() {
        let mut rules = RulesFile::default();
        rules
            .frame_rules
            .insert("nonexistent".to_string(), FrameRuleBinding::default());
        let result = validate_config(&Config::default(), &rules, &frames());
        assert!(!result.has_errors());
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn unknown_enabled_frame_is_an_error() {
        let mut config = Config::default();
        config.frames.enabled.push("ghost".to_string());
        let result = validate_config(&config, &RulesFile::default(), &frames());
        assert!(result.has_errors());
    }

    #[test]
    fn malformed_suppression_key_is_an_error() {
        let mut config = Config::default();
        config.suppressions.push(crate::config::SuppressionRule {
            rule: "security:secret".to_string(),
            files: vec![],
            reason: None,
        });
        let result = validate_config(&config, &RulesFile::default(), &frames());
        assert!(result.has_errors());
    }

    #[test]
    fn invalid_rule_pattern_is_an_error() {
        let mut rules = RulesFile::default();
        rules.rules.push(crate::config::Rule {
            id: "bad".to_string(),
            name: "Bad".to_string(),
            category: String::new(),
            severity: crate::types::Severity::Low,
            pattern: Some("([unclosed".to_string()),
            description: String::new(),
            enabled: true,
            tags: vec![],
        });
        let result = validate_config(&Config::default(), &rules, &frames());
        assert!(result.has_errors());
    }

    #[test]
    fn missing_provider_is_a_warning() {
        let config: Config = serde_yaml::from_str(
            r#"
platforms:
  - name: app
    path: app
    type: react
    role: consumer
"#,
        )
        .unwrap();
        let result = validate_config(&config, &RulesFile::default(), &frames());
        assert!(!result.has_errors());
        assert_eq!(result.warnings().count(), 1);
    }
}
