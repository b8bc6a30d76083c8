//! Rule-driven frame: applies user-defined regex rules from
//! `.warden/rules.yaml`. Installed frame bundles reuse this engine with
//! their own metadata and bundled rules.

use async_trait::async_trait;
use regex::Regex;
use tracing::warn;

use super::{scan_files, Frame, FrameContext, FrameMetadata, PipelinePhase};
use crate::config::{Rule, RulesFile};
use crate::discovery::DiscoveredFile;
use crate::error::Result;
use crate::types::{Finding, Priority};

/// A rule with its pattern compiled once
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: Rule,
    regex: Regex,
}

impl CompiledRule {
    pub fn compile(rule: &Rule) -> Option<Self> {
        let pattern = rule.pattern.as_deref()?;
        match Regex::new(pattern) {
            Ok(regex) => Some(Self {
                rule: rule.clone(),
                regex,
            }),
            Err(e) => {
                warn!("rule '{}' has an invalid pattern, skipping: {}", rule.id, e);
                None
            }
        }
    }
}

/// Compile the enabled rules out of a list, dropping pattern-less and
/// broken ones.
pub fn compile_rules(rules: &[Rule]) -> Vec<CompiledRule> {
    rules
        .iter()
        .filter(|r| r.enabled)
        .filter_map(CompiledRule::compile)
        .collect()
}

/// Apply compiled rules line-wise to a batch, attributing findings to
/// `frame_id`. Also used by the orchestrator for pre/post rule hooks.
pub async fn apply_rules(
    frame_id: &str,
    rules: &[CompiledRule],
    batch: &[DiscoveredFile],
    ctx: &FrameContext,
) -> Result<Vec<Finding>> {
    if rules.is_empty() {
        return Ok(Vec::new());
    }
    scan_files(batch, ctx, |file, content| {
        let mut findings = Vec::new();
        for (i, line) in content.lines().enumerate() {
            for compiled in rules {
                if let Some(m) = compiled.regex.find(line) {
                    let message = if compiled.rule.description.is_empty() {
                        compiled.rule.name.clone()
                    } else {
                        compiled.rule.description.clone()
                    };
                    let mut finding = Finding::new(frame_id, compiled.rule.severity, message)
                        .with_rule(&compiled.rule.id)
                        .with_location(file.path.clone(), i as u32 + 1)
                        .with_column(m.start() as u32 + 1)
                        .with_snippet(line.trim());
                    for tag in &compiled.rule.tags {
                        finding = finding.with_tag(tag);
                    }
                    findings.push(finding);
                }
            }
        }
        findings
    })
    .await
}

/// Frame running the `rules:` section of `.warden/rules.yaml`
pub struct CustomRuleFrame {
    metadata: FrameMetadata,
    rules: Vec<CompiledRule>,
}

impl CustomRuleFrame {
    /// Build the frame from the project rule set; `None` when no enabled
    /// rule carries a pattern.
    pub fn from_rules(rules: &RulesFile) -> Option<Self> {
        let compiled = compile_rules(&rules.rules);
        if compiled.is_empty() {
            return None;
        }
        Some(Self {
            metadata: FrameMetadata {
                id: "custom".to_string(),
                name: "Custom Rules".to_string(),
                description: "User-defined validation rules".to_string(),
                phase: PipelinePhase::Validation,
                priority: Priority::Medium,
                is_blocker: false,
                tags: vec!["custom".to_string()],
                supported_languages: None,
                depends_on: vec![],
                parallel_safe: true,
            },
            rules: compiled,
        })
    }

    /// Build an installed-frame instance with its own metadata and bundled
    /// rules.
    pub fn with_metadata(metadata: FrameMetadata, rules: Vec<CompiledRule>) -> Self {
        Self { metadata, rules }
    }
}

#[async_trait]
impl Frame for CustomRuleFrame {
    fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    async fn execute(&self, batch: &[DiscoveredFile], ctx: &FrameContext) -> Result<Vec<Finding>> {
        apply_rules(&self.metadata.id, &self.rules, batch, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::test_support;
    use crate::types::Severity;

    fn rules_file(yaml: &str) -> RulesFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[tokio::test]
    async fn custom_rule_produces_findings() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _tx) = test_support::context(dir.path());
        let rules = rules_file(
            r#"
rules:
  - id: no-print
    name: No print statements
    category: hygiene
    severity: low
    pattern: 'print\('
    description: Use the logger instead of print
"#,
        );
        let files = vec![test_support::discovered(
            dir.path(),
            "app.py",
            "print('debug')\nlogger.info('ok')\n",
        )];

        let frame = CustomRuleFrame::from_rules(&rules).expect("frame built");
        let findings = frame.execute(&files, &ctx).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id.as_deref(), Some("no-print"));
        assert_eq!(findings[0].severity, Severity::Low);
        assert_eq!(findings[0].message, "Use the logger instead of print");
    }

    #[test]
    fn no_patterned_rules_means_no_frame() {
        let rules = rules_file(
            r#"
rules:
  - id: doc-only
    name: Documentation rule
    severity: info
"#,
        );
        assert!(CustomRuleFrame::from_rules(&rules).is_none());
    }

    #[test]
    fn broken_patterns_are_dropped_not_fatal() {
        let rules = rules_file(
            r#"
rules:
  - id: bad
    name: Broken
    severity: low
    pattern: '([unclosed'
  - id: good
    name: Fine
    severity: low
    pattern: 'TODO'
"#,
        );
        let compiled = compile_rules(&rules.rules);
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].rule.id, "good");
    }
}
