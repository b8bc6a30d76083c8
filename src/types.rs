use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Schema version for the JSON result format
pub const RESULTS_SCHEMA_VERSION: &str = "1.0.0";

/// Number of hex characters exposed as the public fingerprint (16 bytes)
const FINGERPRINT_HEX_LEN: usize = 32;

/// Stable finding fingerprint over the canonical identity tuple.
///
/// The tuple deliberately excludes columns: moving a finding sideways on the
/// same line must not produce a "new" issue across runs.
pub fn finding_fingerprint(
    frame_id: &str,
    rule_id: Option<&str>,
    file_path: Option<&str>,
    line: Option<u32>,
    message: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(frame_id.as_bytes());
    hasher.update([0]);
    hasher.update(rule_id.unwrap_or("").as_bytes());
    hasher.update([0]);
    hasher.update(file_path.unwrap_or("").as_bytes());
    hasher.update([0]);
    hasher.update(line.unwrap_or(0).to_le_bytes());
    hasher.update([0]);
    hasher.update(canonicalize_message(message).as_bytes());
    format!("{:x}", hasher.finalize())[..FINGERPRINT_HEX_LEN].to_string()
}

/// Collapse runs of whitespace and trim, so cosmetic message edits do not
/// change finding identity.
pub fn canonicalize_message(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Severity of a single finding. Ordered most severe first so that sorting
/// ascending puts critical findings at the top.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// A single reported issue produced by a frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub frame_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_end: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    pub fingerprint: String,
}

impl Finding {
    pub fn new(frame_id: &str, severity: Severity, message: impl Into<String>) -> Self {
        let message = message.into();
        let fingerprint = finding_fingerprint(frame_id, None, None, None, &message);
        Self {
            frame_id: frame_id.to_string(),
            rule_id: None,
            severity,
            message,
            file_path: None,
            line: None,
            line_end: None,
            column: None,
            column_end: None,
            code_snippet: None,
            tags: Vec::new(),
            metadata: HashMap::new(),
            fingerprint,
        }
    }

    pub fn with_rule(mut self, rule_id: &str) -> Self {
        self.rule_id = Some(rule_id.to_string());
        self.refresh_fingerprint();
        self
    }

    pub fn with_location(mut self, file_path: PathBuf, line: u32) -> Self {
        self.file_path = Some(file_path);
        self.line = Some(line);
        self.refresh_fingerprint();
        self
    }

    pub fn with_line_end(mut self, line_end: u32) -> Self {
        self.line_end = Some(line_end);
        self
    }

    pub fn with_column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_column_end(mut self, column_end: u32) -> Self {
        self.column_end = Some(column_end);
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.code_snippet = Some(snippet.into());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// The operation/entity this finding is about, used as the third segment
    /// of the suppression key. Absent means the wildcard segment.
    pub fn target(&self) -> Option<&str> {
        self.metadata.get("target").and_then(|v| v.as_str())
    }

    /// Suppression key `"{frame_id}:{rule_id or '*'}:{target or '*'}"`
    pub fn suppression_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.frame_id,
            self.rule_id.as_deref().unwrap_or("*"),
            self.target().unwrap_or("*"),
        )
    }

    /// Recompute the fingerprint after any identity field changed
    pub fn refresh_fingerprint(&mut self) {
        self.fingerprint = finding_fingerprint(
            &self.frame_id,
            self.rule_id.as_deref(),
            self.file_path.as_ref().and_then(|p| p.to_str()),
            self.line,
            &self.message,
        );
    }
}

/// Scheduling priority of a frame. Rank order: critical=0, high=1,
/// medium=2, low=3.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Policy applied when a frame fails with blocker findings or errors out
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnFail {
    #[default]
    Continue,
    Stop,
    SkipDependents,
}

/// Execution status of a single frame
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FrameStatus {
    Running,
    Passed,
    Failed,
    Warning,
    Skipped,
    Errored,
}

impl std::fmt::Display for FrameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FrameStatus::Running => "running",
            FrameStatus::Passed => "passed",
            FrameStatus::Failed => "failed",
            FrameStatus::Warning => "warning",
            FrameStatus::Skipped => "skipped",
            FrameStatus::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// Result of one frame's execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameResult {
    pub frame_id: String,
    pub frame_name: String,
    pub status: FrameStatus,
    pub duration_ms: u64,
    pub is_blocker: bool,
    pub findings: Vec<Finding>,
    pub issues_found: usize,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl FrameResult {
    pub fn new(frame_id: &str, frame_name: &str, is_blocker: bool) -> Self {
        Self {
            frame_id: frame_id.to_string(),
            frame_name: frame_name.to_string(),
            status: FrameStatus::Running,
            duration_ms: 0,
            is_blocker,
            findings: Vec::new(),
            issues_found: 0,
            metadata: HashMap::new(),
        }
    }

}

/// Overall pipeline status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Success,
    Failed,
    Partial,
    Running,
    Cancelled,
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PipelineStatus::Success => "success",
            PipelineStatus::Failed => "failed",
            PipelineStatus::Partial => "partial",
            PipelineStatus::Running => "running",
            PipelineStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Severity tallies across surviving findings. Info findings count here;
/// threshold exclusion is the thresholds' concern, not the tally's.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

/// Immutable result of one pipeline invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub pipeline_id: Uuid,
    pub pipeline_name: String,
    pub status: PipelineStatus,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total_frames: usize,
    pub frames_passed: usize,
    pub frames_failed: usize,
    pub frames_skipped: usize,
    pub findings_by_severity: SeverityCounts,
    pub total_findings: usize,
    pub frame_results: Vec<FrameResult>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl PipelineResult {
    pub fn new(pipeline_name: &str) -> Self {
        Self {
            pipeline_id: Uuid::new_v4(),
            pipeline_name: pipeline_name.to_string(),
            status: PipelineStatus::Running,
            started_at: Utc::now(),
            duration_ms: 0,
            total_frames: 0,
            frames_passed: 0,
            frames_failed: 0,
            frames_skipped: 0,
            findings_by_severity: SeverityCounts::default(),
            total_findings: 0,
            frame_results: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Iterate all surviving findings across frames
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.frame_results.iter().flat_map(|r| r.findings.iter())
    }

    pub fn suppressed_count(&self) -> usize {
        self.metadata
            .get("suppressed_gaps")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
