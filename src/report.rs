//! Report persistence under `.warden/reports/` plus the `ai_status.md`
//! pass/fail marker consumed by `warden status` and external tooling.

use anyhow::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::output::{to_markdown, to_report_json};
use crate::types::{PipelineResult, PipelineStatus};
use crate::utils::paths::ensure_parent_dir;

/// Relative path of the status marker file
pub const AI_STATUS_PATH: &str = ".warden/ai_status.md";

/// Paths of the reports written for one scan
#[derive(Debug, Clone)]
pub struct WrittenReports {
    pub json: PathBuf,
    pub markdown: PathBuf,
}

/// Write `scan-<ts>.json` and `scan-<ts>.md` into the reports directory and
/// refresh `ai_status.md`.
pub async fn write_reports(
    root: &Path,
    reports_dir: &Path,
    result: &PipelineResult,
) -> Result<WrittenReports> {
    let dir = if reports_dir.is_absolute() {
        reports_dir.to_path_buf()
    } else {
        root.join(reports_dir)
    };
    tokio::fs::create_dir_all(&dir).await?;

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    let json_path = dir.join(format!("scan-{}.json", timestamp));
    let md_path = dir.join(format!("scan-{}.md", timestamp));

    let json = serde_json::to_string_pretty(&to_report_json(result))?;
    tokio::fs::write(&json_path, json).await?;
    tokio::fs::write(&md_path, to_markdown(result)).await?;
    info!("wrote reports to {}", dir.display());

    write_ai_status(root, result).await?;

    Ok(WrittenReports {
        json: json_path,
        markdown: md_path,
    })
}

/// `PASS|FAIL|PENDING` plus a one-paragraph last-run summary.
pub async fn write_ai_status(root: &Path, result: &PipelineResult) -> Result<()> {
    let marker = match result.status {
        PipelineStatus::Success | PipelineStatus::Partial => "PASS",
        PipelineStatus::Failed => "FAIL",
        PipelineStatus::Running | PipelineStatus::Cancelled => "PENDING",
    };
    let content = format!(
        "{}\n\nLast run: {} — status {}, {} findings ({} critical, {} high) across {} frames in {} ms.\n",
        marker,
        result.started_at.to_rfc3339(),
        result.status,
        result.total_findings,
        result.findings_by_severity.critical,
        result.findings_by_severity.high,
        result.total_frames,
        result.duration_ms,
    );
    let path = root.join(AI_STATUS_PATH);
    ensure_parent_dir(&path).await?;
    tokio::fs::write(&path, content).await?;
    Ok(())
}

/// Read the current status marker, defaulting to `PENDING` when no run has
/// happened yet.
pub async fn read_ai_status(root: &Path) -> String {
    tokio::fs::read_to_string(root.join(AI_STATUS_PATH))
        .await
        .unwrap_or_else(|_| "PENDING\n\nNo scan has completed yet.\n".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_status(status: PipelineStatus) -> PipelineResult {
        let mut result = PipelineResult::new("demo");
        result.status = status;
        result
    }

    #[tokio::test]
    async fn writes_json_md_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let result = result_with_status(PipelineStatus::Success);
        let written = write_reports(dir.path(), Path::new(".warden/reports"), &result)
            .await
            .unwrap();

        assert!(written.json.exists());
        assert!(written.markdown.exists());
        let status = read_ai_status(dir.path()).await;
        assert!(status.starts_with("PASS"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written.json).unwrap()).unwrap();
        assert_eq!(json["status"], "success");
    }

    #[tokio::test]
    async fn failed_run_marks_fail() {
        let dir = tempfile::tempdir().unwrap();
        write_ai_status(dir.path(), &result_with_status(PipelineStatus::Failed))
            .await
            .unwrap();
        assert!(read_ai_status(dir.path()).await.starts_with("FAIL"));
    }

    #[tokio::test]
    async fn missing_status_is_pending() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_ai_status(dir.path()).await.starts_with("PENDING"));
    }
}
