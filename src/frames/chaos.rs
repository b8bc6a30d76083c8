//! Chaos frame: failure-handling hygiene. Code that swallows, ignores or
//! amplifies failures shows up here before it shows up in an incident.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{scan_files, Frame, FrameContext, FrameMetadata, PipelinePhase};
use crate::discovery::{DiscoveredFile, FileType};
use crate::error::Result;
use crate::types::{Finding, Priority, Severity};

static BARE_EXCEPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*except\s*:\s*$").expect("valid pattern"));
static SILENT_PASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*except\b.*:\s*pass\s*$").expect("valid pattern"));
static EMPTY_CATCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"catch\s*\([^)]*\)\s*\{\s*\}").expect("valid pattern"));
static UNWRAP_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.unwrap\(\)|\.expect\(").expect("valid pattern"));
static PANIC_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bpanic!\s*\(").expect("valid pattern"));
static INFINITE_RETRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"while\s+(True|true)\s*:?\s*.*retry").expect("valid pattern"));

pub struct ChaosFrame {
    metadata: FrameMetadata,
}

impl ChaosFrame {
    pub fn new() -> Self {
        Self {
            metadata: FrameMetadata {
                id: "chaos".to_string(),
                name: "Chaos".to_string(),
                description: "Flags swallowed errors, bare excepts and unbounded retries"
                    .to_string(),
                phase: PipelinePhase::Fortification,
                priority: Priority::Medium,
                is_blocker: false,
                tags: vec!["resilience".to_string()],
                supported_languages: None,
                depends_on: vec![],
                parallel_safe: true,
            },
        }
    }

    fn scan_line(file: &DiscoveredFile, line: &str, line_number: u32) -> Option<Finding> {
        let make = |rule: &str, severity: Severity, message: &str| {
            Some(
                Finding::new("chaos", severity, message)
                    .with_rule(rule)
                    .with_location(file.path.clone(), line_number)
                    .with_snippet(line.trim()),
            )
        };

        if BARE_EXCEPT.is_match(line) {
            return make("bare_except", Severity::Medium, "Bare except catches everything, including exits");
        }
        if SILENT_PASS.is_match(line) {
            return make("swallowed_error", Severity::Medium, "Exception swallowed without handling");
        }
        if EMPTY_CATCH.is_match(line) {
            return make("swallowed_error", Severity::Medium, "Empty catch block swallows the error");
        }
        if INFINITE_RETRY.is_match(line) {
            return make("unbounded_retry", Severity::High, "Retry loop has no bound or backoff");
        }
        if file.file_type == FileType::Rust {
            // test modules legitimately unwrap
            if PANIC_CALL.is_match(line) {
                return make("panic", Severity::Low, "Explicit panic in library code");
            }
            if UNWRAP_CALL.is_match(line) {
                return make("unwrap", Severity::Low, "Unwrap on a fallible value");
            }
        }
        None
    }
}

impl Default for ChaosFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Frame for ChaosFrame {
    fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    async fn execute(&self, batch: &[DiscoveredFile], ctx: &FrameContext) -> Result<Vec<Finding>> {
        scan_files(batch, ctx, |file, content| {
            content
                .lines()
                .enumerate()
                .filter_map(|(i, line)| Self::scan_line(file, line, i as u32 + 1))
                .collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::test_support;

    #[tokio::test]
    async fn flags_bare_except_and_silent_pass() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _tx) = test_support::context(dir.path());
        let files = vec![test_support::discovered(
            dir.path(),
            "worker.py",
            "try:\n    run()\nexcept:\n    pass\ntry:\n    run()\nexcept ValueError: pass\n",
        )];

        let findings = ChaosFrame::new().execute(&files, &ctx).await.unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].rule_id.as_deref(), Some("bare_except"));
        assert_eq!(findings[1].rule_id.as_deref(), Some("swallowed_error"));
    }

    #[tokio::test]
    async fn unwrap_flagged_only_for_rust() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _tx) = test_support::context(dir.path());
        let files = vec![
            test_support::discovered(dir.path(), "lib.rs", "let x = value.unwrap();\n"),
            test_support::discovered(dir.path(), "app.py", "x = value.unwrap()\n"),
        ];

        let findings = ChaosFrame::new().execute(&files, &ctx).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].file_path.as_ref().unwrap().ends_with("lib.rs"));
    }
}
