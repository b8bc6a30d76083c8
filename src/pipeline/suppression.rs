//! Suppression matching for the finding pipeline.
//!
//! A finding is suppressed when a rule's key pattern matches its suppression
//! key segment-wise and, if the rule carries file globs, at least one glob
//! matches the finding's path. Every decision is logged with the matched
//! rule.

use tracing::info;

use crate::config::SuppressionRule;
use crate::types::Finding;
use crate::utils::glob::{key_match, path_match};

pub struct SuppressionEngine<'a> {
    rules: &'a [SuppressionRule],
}

impl<'a> SuppressionEngine<'a> {
    pub fn new(rules: &'a [SuppressionRule]) -> Self {
        Self { rules }
    }

    /// The first rule suppressing this finding, if any
    pub fn matching_rule(&self, finding: &Finding) -> Option<&'a SuppressionRule> {
        let key = finding.suppression_key();
        self.rules.iter().find(|rule| {
            if !key_match(&rule.rule, &key) {
                return false;
            }
            if rule.files.is_empty() {
                return true;
            }
            let Some(path) = finding.file_path.as_ref().and_then(|p| p.to_str()) else {
                return false;
            };
            rule.files.iter().any(|glob| path_match(glob, path))
        })
    }

    /// Partition findings into survivors and a suppressed count.
    pub fn apply(&self, findings: Vec<Finding>) -> (Vec<Finding>, usize) {
        let mut kept = Vec::with_capacity(findings.len());
        let mut suppressed = 0usize;
        for finding in findings {
            match self.matching_rule(&finding) {
                Some(rule) => {
                    suppressed += 1;
                    info!(
                        "suppressed {} ({}) by rule '{}'{}",
                        finding.suppression_key(),
                        finding.fingerprint,
                        rule.rule,
                        rule.reason
                            .as_deref()
                            .map(|r| format!(": {}", r))
                            .unwrap_or_default()
                    );
                }
                None => kept.push(finding),
            }
        }
        (kept, suppressed)
    }
}
