//! Human-readable Markdown summary report.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::PathBuf;

use crate::types::PipelineResult;

const TOP_FILES: usize = 10;

/// Render the Markdown summary: totals, severity breakdown, per-frame
/// table and the top offending files.
pub fn to_markdown(result: &PipelineResult) -> String {
    let mut md = String::with_capacity(4096);

    writeln!(md, "# Warden Scan Report").ok();
    writeln!(md).ok();
    writeln!(md, "- **Pipeline:** {}", result.pipeline_name).ok();
    writeln!(md, "- **Status:** {}", result.status).ok();
    writeln!(md, "- **Duration:** {} ms", result.duration_ms).ok();
    writeln!(
        md,
        "- **Frames:** {} total, {} passed, {} failed, {} skipped",
        result.total_frames, result.frames_passed, result.frames_failed, result.frames_skipped
    )
    .ok();
    writeln!(md, "- **Findings:** {}", result.total_findings).ok();
    if result.suppressed_count() > 0 {
        writeln!(md, "- **Suppressed:** {}", result.suppressed_count()).ok();
    }
    writeln!(md).ok();

    writeln!(md, "## Severity Breakdown").ok();
    writeln!(md).ok();
    writeln!(md, "| Severity | Count |").ok();
    writeln!(md, "|----------|-------|").ok();
    let counts = &result.findings_by_severity;
    for (name, count) in [
        ("critical", counts.critical),
        ("high", counts.high),
        ("medium", counts.medium),
        ("low", counts.low),
        ("info", counts.info),
    ] {
        writeln!(md, "| {} | {} |", name, count).ok();
    }
    writeln!(md).ok();

    writeln!(md, "## Frames").ok();
    writeln!(md).ok();
    writeln!(md, "| Frame | Status | Issues | Duration |").ok();
    writeln!(md, "|-------|--------|--------|----------|").ok();
    for frame in &result.frame_results {
        writeln!(
            md,
            "| {} | {} | {} | {} ms |",
            frame.frame_name, frame.status, frame.issues_found, frame.duration_ms
        )
        .ok();
    }
    writeln!(md).ok();

    let top = top_offending_files(result);
    if !top.is_empty() {
        writeln!(md, "## Top Offending Files").ok();
        writeln!(md).ok();
        for (path, count) in top {
            writeln!(md, "- `{}` — {} findings", path.display(), count).ok();
        }
        writeln!(md).ok();
    }

    md
}

fn top_offending_files(result: &PipelineResult) -> Vec<(PathBuf, usize)> {
    let mut counts: HashMap<&PathBuf, usize> = HashMap::new();
    for finding in result.findings() {
        if let Some(path) = &finding.file_path {
            *counts.entry(path).or_insert(0) += 1;
        }
    }
    let mut entries: Vec<(PathBuf, usize)> =
        counts.into_iter().map(|(p, c)| (p.clone(), c)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(TOP_FILES);
    entries
}
