//! # CI Integration Layer
//!
//! Detects the CI platform from environment variables and emits per-platform
//! annotations. Annotations go to stdout, one line per finding, never
//! interleaved with report JSON (reports go to files).

use serde_json::json;
use std::io::Write;

use crate::types::{PipelineResult, PipelineStatus, Severity};

/// Supported CI platforms, detected first-match in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiPlatform {
    Github,
    Gitlab,
    Azure,
    Jenkins,
    CircleCi,
    Travis,
    Unknown,
}

impl CiPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            CiPlatform::Github => "github",
            CiPlatform::Gitlab => "gitlab",
            CiPlatform::Azure => "azure",
            CiPlatform::Jenkins => "jenkins",
            CiPlatform::CircleCi => "circleci",
            CiPlatform::Travis => "travis",
            CiPlatform::Unknown => "unknown",
        }
    }
}

/// Environment-variable detection; first match wins.
pub fn detect_platform() -> CiPlatform {
    let var = |name: &str| std::env::var(name).unwrap_or_default();
    if var("GITHUB_ACTIONS") == "true" {
        CiPlatform::Github
    } else if var("GITLAB_CI") == "true" {
        CiPlatform::Gitlab
    } else if var("TF_BUILD") == "True" {
        CiPlatform::Azure
    } else if std::env::var("JENKINS_HOME").is_ok() {
        CiPlatform::Jenkins
    } else if var("CIRCLECI") == "true" {
        CiPlatform::CircleCi
    } else if var("TRAVIS") == "true" {
        CiPlatform::Travis
    } else {
        CiPlatform::Unknown
    }
}

/// Process exit code: 0 pass, 1 blocker findings, 2 pipeline error.
pub fn exit_code(result: &PipelineResult) -> i32 {
    match result.status {
        PipelineStatus::Success | PipelineStatus::Partial => 0,
        PipelineStatus::Failed => 1,
        PipelineStatus::Cancelled | PipelineStatus::Running => 2,
    }
}

/// Emit annotations for the detected platform.
pub fn emit_annotations(
    result: &PipelineResult,
    platform: CiPlatform,
    out: &mut impl Write,
) -> std::io::Result<()> {
    match platform {
        CiPlatform::Github => emit_github(result, out),
        CiPlatform::Gitlab => emit_gitlab(result, out),
        CiPlatform::Azure => emit_azure(result, out),
        _ => Ok(()),
    }
}

fn github_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Info => "notice",
    }
}

/// GitHub workflow commands, one per finding. Newlines in messages are
/// `%0A`-encoded per the workflow-command escaping rules.
fn emit_github(result: &PipelineResult, out: &mut impl Write) -> std::io::Result<()> {
    for frame_result in &result.frame_results {
        for finding in &frame_result.findings {
            let mut props = Vec::new();
            if let Some(file) = &finding.file_path {
                props.push(format!("file={}", file.display()));
            }
            if let Some(line) = finding.line {
                props.push(format!("line={}", line));
            }
            if let Some(column) = finding.column {
                props.push(format!("col={}", column));
            }
            props.push(format!(
                "title={}/{}",
                finding.frame_id,
                finding.rule_id.as_deref().unwrap_or("finding")
            ));
            let message = finding.message.replace('\n', "%0A");
            writeln!(
                out,
                "::{} {}::{}",
                github_level(finding.severity),
                props.join(","),
                message
            )?;
        }
    }
    Ok(())
}

/// GitLab gets a structured JSON line per finding plus a summary record.
fn emit_gitlab(result: &PipelineResult, out: &mut impl Write) -> std::io::Result<()> {
    for frame_result in &result.frame_results {
        for finding in &frame_result.findings {
            let record = json!({
                "severity": finding.severity,
                "frame": finding.frame_id,
                "rule": finding.rule_id,
                "file": finding.file_path,
                "line": finding.line,
                "message": finding.message,
                "fingerprint": finding.fingerprint,
            });
            writeln!(out, "{}", record)?;
        }
    }
    let summary = json!({
        "summary": true,
        "status": result.status,
        "total_findings": result.total_findings,
        "critical": result.findings_by_severity.critical,
        "high": result.findings_by_severity.high,
        "medium": result.findings_by_severity.medium,
        "low": result.findings_by_severity.low,
        "info": result.findings_by_severity.info,
    });
    writeln!(out, "{}", summary)
}

fn emit_azure(result: &PipelineResult, out: &mut impl Write) -> std::io::Result<()> {
    for frame_result in &result.frame_results {
        for finding in &frame_result.findings {
            let kind = match finding.severity {
                Severity::Critical | Severity::High => "error",
                _ => "warning",
            };
            let location = match (&finding.file_path, finding.line) {
                (Some(file), Some(line)) => {
                    format!("sourcepath={};linenumber={};", file.display(), line)
                }
                (Some(file), None) => format!("sourcepath={};", file.display()),
                _ => String::new(),
            };
            writeln!(
                out,
                "##vso[task.logissue type={};{}]{}",
                kind, location, finding.message
            )?;
        }
    }
    writeln!(
        out,
        "##vso[task.setvariable variable=WardenTotalFindings]{}",
        result.total_findings
    )?;
    writeln!(
        out,
        "##vso[task.setvariable variable=WardenCriticalFindings]{}",
        result.findings_by_severity.critical
    )
}

/// Persist result counts into `GITHUB_OUTPUT`/`GITHUB_ENV` when GitHub
/// Actions provides them.
pub fn persist_github_outputs(result: &PipelineResult) -> std::io::Result<()> {
    let lines = format!(
        "status={}\ntotal_findings={}\ncritical_findings={}\nhigh_findings={}\n",
        result.status,
        result.total_findings,
        result.findings_by_severity.critical,
        result.findings_by_severity.high,
    );
    for var in ["GITHUB_OUTPUT", "GITHUB_ENV"] {
        if let Ok(path) = std::env::var(var) {
            if !path.is_empty() {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                file.write_all(lines.as_bytes())?;
            }
        }
    }
    Ok(())
}
