//! Orphan-code frame: definitions nothing references, plus commented-out
//! code blocks left behind.
//!
//! Reference counting is a two-pass text scan over the batch, not an AST
//! analysis; names that look intentionally private or framework-invoked are
//! exempt.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;

use super::{Frame, FrameContext, FrameMetadata, PipelinePhase};
use crate::discovery::{DiscoveredFile, FileType};
use crate::error::{Result, WardenError};
use crate::types::{Finding, Priority, Severity};

const MIN_COMMENTED_BLOCK_LINES: usize = 3;

static PY_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("valid pattern"));
static JS_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?function\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*\(")
        .expect("valid pattern")
});
static COMMENTED_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(#|//)\s*\S+\s*(=|\(|\{|;|:=)").expect("valid pattern")
});

/// Names the runtime or a framework calls without a visible reference
fn is_exempt(name: &str) -> bool {
    name.starts_with('_')
        || name.starts_with("test")
        || matches!(name, "main" | "setup" | "teardown" | "handler" | "lambda_handler")
}

pub struct OrphanFrame {
    metadata: FrameMetadata,
}

impl OrphanFrame {
    pub fn new() -> Self {
        Self {
            metadata: FrameMetadata {
                id: "orphan".to_string(),
                name: "Orphan Code".to_string(),
                description: "Finds unreferenced definitions and commented-out code".to_string(),
                phase: PipelinePhase::Cleaning,
                priority: Priority::Medium,
                is_blocker: false,
                tags: vec!["hygiene".to_string()],
                supported_languages: Some(vec![
                    "python".to_string(),
                    "javascript".to_string(),
                    "typescript".to_string(),
                ]),
                depends_on: vec![],
                parallel_safe: false,
            },
        }
    }

    fn definition_pattern(file_type: FileType) -> Option<&'static Regex> {
        match file_type {
            FileType::Python => Some(&PY_DEF),
            FileType::JavaScript | FileType::TypeScript => Some(&JS_FUNCTION),
            _ => None,
        }
    }

    fn commented_code_findings(file: &DiscoveredFile, content: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut block_start: Option<usize> = None;
        let mut block_len = 0usize;

        let mut lines: Vec<&str> = content.lines().collect();
        // sentinel flushes a block ending at EOF
        lines.push("");
        for (i, line) in lines.iter().enumerate() {
            if COMMENTED_CODE.is_match(line) {
                if block_start.is_none() {
                    block_start = Some(i);
                }
                block_len += 1;
            } else {
                if let Some(start) = block_start {
                    if block_len >= MIN_COMMENTED_BLOCK_LINES {
                        findings.push(
                            Finding::new(
                                "orphan",
                                Severity::Low,
                                format!("{} lines of commented-out code", block_len),
                            )
                            .with_rule("commented_code")
                            .with_location(file.path.clone(), start as u32 + 1)
                            .with_line_end((start + block_len) as u32),
                        );
                    }
                }
                block_start = None;
                block_len = 0;
            }
        }
        findings
    }
}

impl Default for OrphanFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Frame for OrphanFrame {
    fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    async fn execute(&self, batch: &[DiscoveredFile], ctx: &FrameContext) -> Result<Vec<Finding>> {
        // pass 1: collect definitions and file contents
        let mut contents: Vec<(&DiscoveredFile, std::sync::Arc<str>)> = Vec::new();
        let mut definitions: Vec<(String, PathBuf, u32)> = Vec::new();

        for file in batch.iter().filter(|f| f.is_analyzable) {
            if ctx.is_cancelled() {
                return Err(WardenError::Cancelled);
            }
            let Ok(content) = ctx.cache.read(&file.path).await else {
                continue;
            };
            if let Some(pattern) = Self::definition_pattern(file.file_type) {
                for (i, line) in content.lines().enumerate() {
                    if let Some(caps) = pattern.captures(line) {
                        let name = caps[1].to_string();
                        if !is_exempt(&name) {
                            definitions.push((name, file.path.clone(), i as u32 + 1));
                        }
                    }
                }
            }
            contents.push((file, content));
        }

        // pass 2: count references across the whole batch
        let mut reference_counts: HashMap<&str, usize> = HashMap::new();
        for (name, _, _) in &definitions {
            reference_counts.insert(name.as_str(), 0);
        }
        for (_, content) in &contents {
            for (name, count) in reference_counts.iter_mut() {
                *count += content.matches(name).count();
            }
        }

        let mut findings = Vec::new();
        for (name, path, line) in &definitions {
            // the definition itself is one match
            if reference_counts.get(name.as_str()).copied().unwrap_or(0) <= 1 {
                findings.push(
                    Finding::new(
                        "orphan",
                        Severity::Medium,
                        format!("'{}' is defined but never referenced", name),
                    )
                    .with_rule("unreferenced_definition")
                    .with_location(path.clone(), *line)
                    .with_metadata("target", serde_json::json!(name)),
                );
            }
        }

        for (file, content) in &contents {
            findings.extend(Self::commented_code_findings(file, content));
        }

        Ok(findings)
    }
}
