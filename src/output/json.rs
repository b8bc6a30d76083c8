//! JSON result schema. This is the source-of-truth report format; its
//! top-level keys are stable across versions.

use serde_json::{json, Value};

use crate::types::{Finding, PipelineResult};

/// Map a `PipelineResult` onto the public JSON schema.
pub fn to_report_json(result: &PipelineResult) -> Value {
    json!({
        "pipeline_id": result.pipeline_id,
        "pipeline_name": result.pipeline_name,
        "status": result.status,
        "started_at": result.started_at.to_rfc3339(),
        "duration": result.duration_ms,
        "total_frames": result.total_frames,
        "frames_passed": result.frames_passed,
        "frames_failed": result.frames_failed,
        "frames_skipped": result.frames_skipped,
        "total_findings": result.total_findings,
        "critical_findings": result.findings_by_severity.critical,
        "high_findings": result.findings_by_severity.high,
        "medium_findings": result.findings_by_severity.medium,
        "low_findings": result.findings_by_severity.low,
        "info_findings": result.findings_by_severity.info,
        "frame_results": result
            .frame_results
            .iter()
            .map(|frame| {
                json!({
                    "frame_id": frame.frame_id,
                    "frame_name": frame.frame_name,
                    "status": frame.status,
                    "duration": frame.duration_ms,
                    "issues_found": frame.issues_found,
                    "is_blocker": frame.is_blocker,
                    "findings": frame.findings.iter().map(finding_json).collect::<Vec<_>>(),
                    "metadata": frame.metadata,
                })
            })
            .collect::<Vec<_>>(),
        "metadata": result.metadata,
    })
}

fn finding_json(finding: &Finding) -> Value {
    let mut value = json!({
        "severity": finding.severity,
        "message": finding.message,
        "fingerprint": finding.fingerprint,
    });
    let object = value.as_object_mut().expect("finding is an object");
    if let Some(file) = &finding.file_path {
        object.insert("file".to_string(), json!(file));
    }
    if let Some(line) = finding.line {
        object.insert("line".to_string(), json!(line));
    }
    if let Some(line_end) = finding.line_end {
        object.insert("line_end".to_string(), json!(line_end));
    }
    if let Some(column) = finding.column {
        object.insert("column".to_string(), json!(column));
    }
    if let Some(column_end) = finding.column_end {
        object.insert("column_end".to_string(), json!(column_end));
    }
    if let Some(snippet) = &finding.code_snippet {
        object.insert("code".to_string(), json!(snippet));
    }
    if let Some(rule_id) = &finding.rule_id {
        object.insert("rule_id".to_string(), json!(rule_id));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FrameResult, PipelineStatus, Severity};
    use std::path::PathBuf;

    #[test]
    fn top_level_keys_match_the_schema() {
        let mut result = PipelineResult::new("demo");
        result.status = PipelineStatus::Success;
        let report = to_report_json(&result);

        for key in [
            "pipeline_id",
            "pipeline_name",
            "status",
            "duration",
            "total_frames",
            "frames_passed",
            "frames_failed",
            "frames_skipped",
            "total_findings",
            "critical_findings",
            "high_findings",
            "medium_findings",
            "low_findings",
            "info_findings",
            "frame_results",
            "metadata",
        ] {
            assert!(report.get(key).is_some(), "missing key {}", key);
        }
    }

    #[test]
    fn finding_keys_use_report_names() {
        let mut frame = FrameResult::new("security", "Security", true);
        frame.findings = vec![Finding::new("security", Severity::High, "msg")
            .with_rule("secret")
            .with_location(PathBuf::from("a.py"), 3)
            .with_snippet("x = 1")];
        let mut result = PipelineResult::new("demo");
        result.frame_results = vec![frame];

        let report = to_report_json(&result);
        let finding = &report["frame_results"][0]["findings"][0];
        assert_eq!(finding["file"], "a.py");
        assert_eq!(finding["code"], "x = 1");
        assert_eq!(finding["rule_id"], "secret");
        assert!(finding.get("file_path").is_none());
        assert!(finding.get("code_snippet").is_none());
        // absent optionals are omitted, not null
        assert!(finding.get("column").is_none());
    }
}
