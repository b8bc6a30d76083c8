//! # Finding Pipeline
//!
//! The single computation path turning raw frame results into the final
//! `PipelineResult`: normalization, deduplication, suppression, severity
//! rollup and the pipeline status decision. Every scan entry point funnels
//! through [`finalize`]; there is no second summary math.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::suppression::SuppressionEngine;
use crate::config::{SuppressionRule, ThresholdConfig};
use crate::types::{
    Finding, FrameResult, FrameStatus, PipelineResult, PipelineStatus, SeverityCounts,
};
use crate::utils::paths::to_project_relative;

/// Everything the orchestrator hands over for finalization
pub struct FinalizeInput {
    pub pipeline_name: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub frame_results: Vec<FrameResult>,
    /// Cancellation was requested during the run
    pub cancelled: bool,
    /// An `on_fail: stop` frame fired a blocker
    pub stopped: bool,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Run the full finding pipeline and produce the immutable result.
pub fn finalize(
    mut input: FinalizeInput,
    root: &Path,
    suppressions: &[SuppressionRule],
    thresholds: &ThresholdConfig,
) -> PipelineResult {
    for frame_result in &mut input.frame_results {
        normalize(&mut frame_result.findings, root);
    }

    deduplicate(&mut input.frame_results);

    let engine = SuppressionEngine::new(suppressions);
    let mut suppressed_total = 0usize;
    for frame_result in &mut input.frame_results {
        let findings = std::mem::take(&mut frame_result.findings);
        let (kept, suppressed) = engine.apply(findings);
        frame_result.findings = kept;
        suppressed_total += suppressed;
    }

    let mut counts = SeverityCounts::default();
    for frame_result in &mut input.frame_results {
        sort_findings(&mut frame_result.findings);
        frame_result.issues_found = frame_result.findings.len();
        frame_result.status = frame_status(frame_result, thresholds);
        for finding in &frame_result.findings {
            counts.record(finding.severity);
        }
    }

    let frames_passed = count_status(&input.frame_results, |s| {
        matches!(s, FrameStatus::Passed | FrameStatus::Warning)
    });
    let frames_failed = count_status(&input.frame_results, |s| {
        matches!(s, FrameStatus::Failed | FrameStatus::Errored)
    });
    let frames_skipped = count_status(&input.frame_results, |s| *s == FrameStatus::Skipped);
    let any_errored = input
        .frame_results
        .iter()
        .any(|r| r.status == FrameStatus::Errored);

    let status = decide_status(&input, &counts, thresholds, any_errored, frames_skipped);

    let mut metadata = input.metadata;
    metadata.insert(
        "suppressed_gaps".to_string(),
        serde_json::json!(suppressed_total),
    );

    let mut result = PipelineResult::new(&input.pipeline_name);
    result.status = status;
    result.started_at = input.started_at;
    result.duration_ms = input.duration_ms;
    result.total_frames = input.frame_results.len();
    result.frames_passed = frames_passed;
    result.frames_failed = frames_failed;
    result.frames_skipped = frames_skipped;
    result.total_findings = counts.total();
    result.findings_by_severity = counts;
    result.frame_results = input.frame_results;
    result.metadata = metadata;
    result
}

/// Trim messages, make paths project-relative POSIX, drop invalid line
/// numbers, and refresh fingerprints over the normalized identity.
fn normalize(findings: &mut [Finding], root: &Path) {
    for finding in findings {
        finding.message = finding.message.trim().to_string();
        if let Some(path) = &finding.file_path {
            finding.file_path = Some(PathBuf::from(to_project_relative(path, root)));
        }
        if finding.line == Some(0) {
            finding.line = None;
        }
        if finding.line_end.is_some() && finding.line_end < finding.line {
            finding.line_end = None;
        }
        finding.refresh_fingerprint();
    }
}

/// Collapse equal fingerprints across the whole pipeline; the earliest
/// frame (and earliest position within it) wins and records how many
/// duplicates it absorbed.
fn deduplicate(frame_results: &mut [FrameResult]) {
    let mut duplicate_counts: HashMap<String, usize> = HashMap::new();
    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();

    for frame_result in frame_results.iter_mut() {
        frame_result.findings.retain(|finding| {
            if seen.insert(finding.fingerprint.clone()) {
                true
            } else {
                *duplicate_counts.entry(finding.fingerprint.clone()).or_insert(0) += 1;
                false
            }
        });
    }

    if duplicate_counts.is_empty() {
        return;
    }
    for frame_result in frame_results.iter_mut() {
        for finding in &mut frame_result.findings {
            if let Some(count) = duplicate_counts.get(&finding.fingerprint) {
                finding
                    .metadata
                    .insert("duplicate_count".to_string(), serde_json::json!(count));
            }
        }
    }
}

/// Deterministic ordering within a frame
fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.file_path
            .cmp(&b.file_path)
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.column.cmp(&b.column))
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
}

/// Status for an executed frame after suppression. Errored and skipped
/// frames keep their status; `errored` means the frame itself threw.
fn frame_status(frame_result: &FrameResult, thresholds: &ThresholdConfig) -> FrameStatus {
    match frame_result.status {
        FrameStatus::Errored | FrameStatus::Skipped => frame_result.status,
        _ => {
            if frame_result
                .findings
                .iter()
                .any(|f| thresholds.is_blocker(f.severity))
            {
                FrameStatus::Failed
            } else if frame_result.findings.is_empty() {
                FrameStatus::Passed
            } else {
                FrameStatus::Warning
            }
        }
    }
}

fn count_status(results: &[FrameResult], predicate: impl Fn(&FrameStatus) -> bool) -> usize {
    results.iter().filter(|r| predicate(&r.status)).count()
}

fn decide_status(
    input: &FinalizeInput,
    counts: &SeverityCounts,
    thresholds: &ThresholdConfig,
    any_errored: bool,
    frames_skipped: usize,
) -> PipelineStatus {
    if input.cancelled {
        return PipelineStatus::Cancelled;
    }
    if any_errored && counts.critical > 0 {
        return PipelineStatus::Failed;
    }
    if input.stopped {
        return PipelineStatus::Failed;
    }
    if thresholds.fail_on_critical && counts.critical > 0 {
        return PipelineStatus::Failed;
    }
    if thresholds.fail_on_high && counts.high > 0 {
        return PipelineStatus::Failed;
    }
    if thresholds.fail_on_medium && counts.medium > 0 {
        return PipelineStatus::Failed;
    }
    // only strictly-failed frames fail the pipeline here; an errored frame
    // without blocker findings degrades to partial below
    let any_failed = input
        .frame_results
        .iter()
        .any(|r| r.status == FrameStatus::Failed);
    if any_failed {
        return PipelineStatus::Failed;
    }
    if frames_skipped > 0 || any_errored {
        return PipelineStatus::Partial;
    }
    PipelineStatus::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn input(frame_results: Vec<FrameResult>) -> FinalizeInput {
        FinalizeInput {
            pipeline_name: "test".to_string(),
            started_at: Utc::now(),
            duration_ms: 10,
            frame_results,
            cancelled: false,
            stopped: false,
            metadata: HashMap::new(),
        }
    }

    fn frame_with(findings: Vec<Finding>) -> FrameResult {
        let mut result = FrameResult::new("security", "Security", true);
        result.findings = findings;
        result
    }

    fn secret_finding(path: &str, line: u32) -> Finding {
        Finding::new("security", Severity::Critical, "Hardcoded secret detected")
            .with_rule("secret")
            .with_location(PathBuf::from(path), line)
    }

    #[test]
    fn clean_run_is_success() {
        let result = finalize(
            input(vec![frame_with(vec![])]),
            Path::new("/p"),
            &[],
            &ThresholdConfig::default(),
        );
        assert_eq!(result.status, PipelineStatus::Success);
        assert_eq!(result.total_findings, 0);
        assert_eq!(result.frames_passed, 1);
    }

    #[test]
    fn critical_finding_fails_with_default_thresholds() {
        let result = finalize(
            input(vec![frame_with(vec![secret_finding("/p/app.py", 5)])]),
            Path::new("/p"),
            &[],
            &ThresholdConfig::default(),
        );
        assert_eq!(result.status, PipelineStatus::Failed);
        assert_eq!(result.findings_by_severity.critical, 1);
        assert_eq!(
            result.frame_results[0].findings[0].file_path,
            Some(PathBuf::from("app.py"))
        );
    }

    #[test]
    fn suppression_turns_failure_into_success() {
        let suppressions = vec![SuppressionRule {
            rule: "security:secret:*".to_string(),
            files: vec![],
            reason: Some("known fixture".to_string()),
        }];
        let result = finalize(
            input(vec![frame_with(vec![secret_finding("/p/app.py", 5)])]),
            Path::new("/p"),
            &suppressions,
            &ThresholdConfig::default(),
        );
        assert_eq!(result.status, PipelineStatus::Success);
        assert_eq!(result.total_findings, 0);
        assert_eq!(result.suppressed_count(), 1);
    }

    #[test]
    fn duplicates_collapse_to_first_frame() {
        let mut second = FrameResult::new("security2", "Security 2", false);
        second.findings = vec![secret_finding("/p/app.py", 5)];
        let result = finalize(
            input(vec![frame_with(vec![secret_finding("/p/app.py", 5)]), second]),
            Path::new("/p"),
            &[],
            &ThresholdConfig::default(),
        );
        // same fingerprint even though frames differ? no: frame_id is part of
        // the fingerprint, so these do NOT collapse
        assert_eq!(result.total_findings, 2);

        // a true duplicate inside one frame collapses
        let result = finalize(
            input(vec![frame_with(vec![
                secret_finding("/p/app.py", 5),
                secret_finding("/p/app.py", 5),
            ])]),
            Path::new("/p"),
            &[],
            &ThresholdConfig::default(),
        );
        assert_eq!(result.total_findings, 1);
        assert_eq!(
            result.frame_results[0].findings[0].metadata["duplicate_count"],
            serde_json::json!(1)
        );
    }

    #[test]
    fn dedup_is_idempotent() {
        let mut frames = vec![frame_with(vec![
            secret_finding("/p/app.py", 5),
            secret_finding("/p/app.py", 5),
        ])];
        deduplicate(&mut frames);
        let after_first: Vec<String> = frames[0].findings.iter().map(|f| f.fingerprint.clone()).collect();
        deduplicate(&mut frames);
        let after_second: Vec<String> = frames[0].findings.iter().map(|f| f.fingerprint.clone()).collect();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn severity_counts_equal_total() {
        let findings = vec![
            secret_finding("/p/a.py", 1),
            Finding::new("chaos", Severity::Medium, "swallowed")
                .with_rule("swallowed_error")
                .with_location(PathBuf::from("/p/b.py"), 2),
        ];
        let result = finalize(
            input(vec![frame_with(findings)]),
            Path::new("/p"),
            &[],
            &ThresholdConfig::default(),
        );
        assert_eq!(result.findings_by_severity.total(), result.total_findings);
    }

    #[test]
    fn errored_frame_without_blockers_is_partial() {
        let mut errored = FrameResult::new("stress", "Stress", false);
        errored.status = FrameStatus::Errored;
        let result = finalize(
            input(vec![frame_with(vec![]), errored]),
            Path::new("/p"),
            &[],
            &ThresholdConfig::default(),
        );
        assert_eq!(result.status, PipelineStatus::Partial);
    }

    #[test]
    fn cancelled_wins_over_everything() {
        let mut finalize_input = input(vec![frame_with(vec![secret_finding("/p/a.py", 1)])]);
        finalize_input.cancelled = true;
        let result = finalize(
            finalize_input,
            Path::new("/p"),
            &[],
            &ThresholdConfig::default(),
        );
        assert_eq!(result.status, PipelineStatus::Cancelled);
    }

    #[test]
    fn findings_sorted_by_path_line_column_rule() {
        let findings = vec![
            Finding::new("security", Severity::Low, "b")
                .with_rule("r2")
                .with_location(PathBuf::from("/p/b.py"), 9),
            Finding::new("security", Severity::Low, "a")
                .with_rule("r1")
                .with_location(PathBuf::from("/p/a.py"), 4),
            Finding::new("security", Severity::Low, "a2")
                .with_rule("r1")
                .with_location(PathBuf::from("/p/a.py"), 2),
        ];
        let result = finalize(
            input(vec![frame_with(findings)]),
            Path::new("/p"),
            &[],
            &ThresholdConfig {
                fail_on_critical: false,
                fail_on_high: false,
                fail_on_medium: false,
            },
        );
        let positions: Vec<(String, u32)> = result.frame_results[0]
            .findings
            .iter()
            .map(|f| {
                (
                    f.file_path.as_ref().unwrap().to_string_lossy().into_owned(),
                    f.line.unwrap(),
                )
            })
            .collect();
        assert_eq!(
            positions,
            vec![
                ("a.py".to_string(), 2),
                ("a.py".to_string(), 4),
                ("b.py".to_string(), 9)
            ]
        );
    }
}
