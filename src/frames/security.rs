//! Security frame: hardcoded secrets, injection patterns, weak cryptography
//! and dangerous calls, detected line-wise with precompiled patterns.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{scan_files, Frame, FrameContext, FrameMetadata, PipelinePhase};
use crate::discovery::DiscoveredFile;
use crate::error::Result;
use crate::types::{Finding, Priority, Severity};

struct SecurityPattern {
    rule_id: &'static str,
    severity: Severity,
    regex: Regex,
    message: &'static str,
}

static SECURITY_PATTERNS: Lazy<Vec<SecurityPattern>> = Lazy::new(|| {
    vec![
        SecurityPattern {
            rule_id: "secret",
            severity: Severity::Critical,
            regex: Regex::new(
                r#"(?i)(password|passwd|secret|api[_-]?key|access[_-]?token|auth[_-]?token)\s*[:=]\s*["'][^"']{8,}["']"#,
            )
            .expect("valid pattern"),
            message: "Hardcoded secret detected",
        },
        SecurityPattern {
            rule_id: "secret",
            severity: Severity::Critical,
            regex: Regex::new(r"AKIA[0-9A-Z]{16}").expect("valid pattern"),
            message: "AWS access key id in source",
        },
        SecurityPattern {
            rule_id: "private_key",
            severity: Severity::Critical,
            regex: Regex::new(r"-----BEGIN (RSA |EC |OPENSSH )?PRIVATE KEY-----")
                .expect("valid pattern"),
            message: "Private key material in source",
        },
        SecurityPattern {
            rule_id: "sql_injection",
            severity: Severity::High,
            regex: Regex::new(
                r#"(?i)(execute|query|cursor\.execute)\s*\(\s*(f["']|["'].*["']\s*[+%]|.*\.format\()"#,
            )
            .expect("valid pattern"),
            message: "SQL built from string interpolation",
        },
        SecurityPattern {
            rule_id: "command_injection",
            severity: Severity::High,
            regex: Regex::new(r"(?i)(subprocess\.(call|run|Popen).*shell\s*=\s*True|os\.system\s*\()")
                .expect("valid pattern"),
            message: "Shell command built from program state",
        },
        SecurityPattern {
            rule_id: "weak_crypto",
            severity: Severity::Medium,
            regex: Regex::new(r"(?i)\b(md5|sha1|des|rc4)\s*\(").expect("valid pattern"),
            message: "Weak cryptographic algorithm",
        },
        SecurityPattern {
            rule_id: "dangerous_function",
            severity: Severity::High,
            regex: Regex::new(r"\b(eval|exec)\s*\(").expect("valid pattern"),
            message: "Dynamic code execution",
        },
        SecurityPattern {
            rule_id: "unsafe_deserialization",
            severity: Severity::High,
            regex: Regex::new(r"pickle\.loads?\s*\(|\byaml\.load\s*\(").expect("valid pattern"),
            message: "Unsafe deserialization of untrusted data",
        },
    ]
});

pub struct SecurityFrame {
    metadata: FrameMetadata,
}

impl SecurityFrame {
    pub fn new() -> Self {
        Self {
            metadata: FrameMetadata {
                id: "security".to_string(),
                name: "Security".to_string(),
                description: "Detects secrets, injection patterns and dangerous calls".to_string(),
                phase: PipelinePhase::Analysis,
                priority: Priority::Critical,
                is_blocker: true,
                tags: vec!["security".to_string()],
                supported_languages: None,
                depends_on: vec![],
                parallel_safe: true,
            },
        }
    }

    fn scan_line(file: &DiscoveredFile, line: &str, line_number: u32) -> Vec<Finding> {
        let trimmed = line.trim_start();
        // comments routinely quote the patterns we look for
        if trimmed.starts_with("//") || trimmed.starts_with('#') {
            return Vec::new();
        }
        let mut findings = Vec::new();
        for pattern in SECURITY_PATTERNS.iter() {
            if let Some(m) = pattern.regex.find(line) {
                findings.push(
                    Finding::new("security", pattern.severity, pattern.message)
                        .with_rule(pattern.rule_id)
                        .with_location(file.path.clone(), line_number)
                        .with_column(m.start() as u32 + 1)
                        .with_snippet(line.trim())
                        .with_tag("security"),
                );
                // one finding per line keeps reports readable
                break;
            }
        }
        findings
    }
}

impl Default for SecurityFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Frame for SecurityFrame {
    fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    async fn execute(&self, batch: &[DiscoveredFile], ctx: &FrameContext) -> Result<Vec<Finding>> {
        scan_files(batch, ctx, |file, content| {
            content
                .lines()
                .enumerate()
                .flat_map(|(i, line)| Self::scan_line(file, line, i as u32 + 1))
                .collect()
        })
        .await
    }
}
