//! Architecture frame: structural smells that erode maintainability.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{scan_files, Frame, FrameContext, FrameMetadata, PipelinePhase};
use crate::discovery::DiscoveredFile;
use crate::error::Result;
use crate::types::{Finding, Priority, Severity};

const MAX_FILE_LINES: usize = 800;
const MAX_IMPORTS: usize = 40;

static WILDCARD_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(from\s+\S+\s+import\s+\*|import\s+\*)").expect("valid pattern"));
static DEEP_RELATIVE_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*from\s+\.{3,}").expect("valid pattern"));
static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(import\s+\w|from\s+\S+\s+import|use\s+\w|require\s*\(|#include\s)"#)
        .expect("valid pattern")
});

pub struct ArchitectureFrame {
    metadata: FrameMetadata,
}

impl ArchitectureFrame {
    pub fn new() -> Self {
        Self {
            metadata: FrameMetadata {
                id: "architecture".to_string(),
                name: "Architecture".to_string(),
                description: "Flags oversized modules, wildcard imports and layering smells"
                    .to_string(),
                phase: PipelinePhase::Classification,
                priority: Priority::High,
                is_blocker: false,
                tags: vec!["architecture".to_string()],
                supported_languages: None,
                depends_on: vec![],
                parallel_safe: true,
            },
        }
    }

    fn scan_file(file: &DiscoveredFile, content: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        let lines: Vec<&str> = content.lines().collect();

        if lines.len() > MAX_FILE_LINES {
            findings.push(
                Finding::new(
                    "architecture",
                    Severity::Medium,
                    format!(
                        "File has {} lines; consider splitting above {}",
                        lines.len(),
                        MAX_FILE_LINES
                    ),
                )
                .with_rule("oversized_file")
                .with_location(file.path.clone(), 1),
            );
        }

        let import_count = lines.iter().filter(|l| IMPORT_LINE.is_match(l)).count();
        if import_count > MAX_IMPORTS {
            findings.push(
                Finding::new(
                    "architecture",
                    Severity::Low,
                    format!(
                        "{} imports in one module; high coupling above {}",
                        import_count, MAX_IMPORTS
                    ),
                )
                .with_rule("import_fanout")
                .with_location(file.path.clone(), 1),
            );
        }

        for (i, line) in lines.iter().enumerate() {
            if WILDCARD_IMPORT.is_match(line) {
                findings.push(
                    Finding::new(
                        "architecture",
                        Severity::Medium,
                        "Wildcard import hides the module surface",
                    )
                    .with_rule("wildcard_import")
                    .with_location(file.path.clone(), i as u32 + 1)
                    .with_snippet(line.trim()),
                );
            }
            if DEEP_RELATIVE_IMPORT.is_match(line) {
                findings.push(
                    Finding::new(
                        "architecture",
                        Severity::Low,
                        "Deep relative import couples distant packages",
                    )
                    .with_rule("deep_relative_import")
                    .with_location(file.path.clone(), i as u32 + 1)
                    .with_snippet(line.trim()),
                );
            }
        }

        findings
    }
}

impl Default for ArchitectureFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Frame for ArchitectureFrame {
    fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    async fn execute(&self, batch: &[DiscoveredFile], ctx: &FrameContext) -> Result<Vec<Finding>> {
        scan_files(batch, ctx, |file, content| Self::scan_file(file, content)).await
    }
}
