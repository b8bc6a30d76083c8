//! Stress frame: patterns that behave fine in development and collapse
//! under production load.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{scan_files, Frame, FrameContext, FrameMetadata, PipelinePhase};
use crate::discovery::DiscoveredFile;
use crate::error::Result;
use crate::types::{Finding, Priority, Severity};

static SELECT_STAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)["']\s*SELECT\s+\*\s+FROM"#).expect("valid pattern"));
static BLOCKING_SLEEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(time\.sleep|Thread\.sleep|sleep)\s*\(").expect("valid pattern"));
static ASYNC_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\basync\s+(def|fn|function)\b").expect("valid pattern"));
static QUERY_IN_LOOP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*for\b.*:\s*$").expect("valid pattern")
});
static QUERY_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(query|execute|find|get|fetch)\s*\(").expect("valid pattern")
});
static UNBOUNDED_READ: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(read|readlines)\(\)\s*$").expect("valid pattern")
});

pub struct StressFrame {
    metadata: FrameMetadata,
}

impl StressFrame {
    pub fn new() -> Self {
        Self {
            metadata: FrameMetadata {
                id: "stress".to_string(),
                name: "Stress".to_string(),
                description: "Flags N+1 queries, blocking sleeps and unbounded reads".to_string(),
                phase: PipelinePhase::Fortification,
                priority: Priority::Low,
                is_blocker: false,
                tags: vec!["performance".to_string()],
                supported_languages: None,
                depends_on: vec![],
                parallel_safe: true,
            },
        }
    }

    fn scan_file(file: &DiscoveredFile, content: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        let is_async_file = ASYNC_MARKER.is_match(content);
        let lines: Vec<&str> = content.lines().collect();

        for (i, line) in lines.iter().enumerate() {
            let line_number = i as u32 + 1;
            if SELECT_STAR.is_match(line) {
                findings.push(
                    Finding::new("stress", Severity::Low, "SELECT * fetches unbounded columns")
                        .with_rule("select_star")
                        .with_location(file.path.clone(), line_number)
                        .with_snippet(line.trim()),
                );
            }
            if is_async_file && BLOCKING_SLEEP.is_match(line) && !line.contains("asyncio.sleep") {
                findings.push(
                    Finding::new(
                        "stress",
                        Severity::Medium,
                        "Blocking sleep stalls the async executor",
                    )
                    .with_rule("blocking_sleep")
                    .with_location(file.path.clone(), line_number)
                    .with_snippet(line.trim()),
                );
            }
            if UNBOUNDED_READ.is_match(line) {
                findings.push(
                    Finding::new(
                        "stress",
                        Severity::Low,
                        "Whole-file read with no size bound",
                    )
                    .with_rule("unbounded_read")
                    .with_location(file.path.clone(), line_number)
                    .with_snippet(line.trim()),
                );
            }
            // query call directly under a loop header is the N+1 shape
            if QUERY_IN_LOOP.is_match(line) {
                if let Some(next) = lines.get(i + 1) {
                    if QUERY_CALL.is_match(next) {
                        findings.push(
                            Finding::new(
                                "stress",
                                Severity::Medium,
                                "Query inside a loop; batch it instead",
                            )
                            .with_rule("query_in_loop")
                            .with_location(file.path.clone(), line_number + 1)
                            .with_snippet(next.trim()),
                        );
                    }
                }
            }
        }
        findings
    }
}

impl Default for StressFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Frame for StressFrame {
    fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    async fn execute(&self, batch: &[DiscoveredFile], ctx: &FrameContext) -> Result<Vec<Finding>> {
        scan_files(batch, ctx, |file, content| Self::scan_file(file, content)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::test_support;

    #[tokio::test]
    async fn flags_query_in_loop() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _tx) = test_support::context(dir.path());
        let files = vec![test_support::discovered(
            dir.path(),
            "orders.py",
            "for order in orders:\n    db.query(order.id)\n",
        )];

        let findings = StressFrame::new().execute(&files, &ctx).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id.as_deref(), Some("query_in_loop"));
        assert_eq!(findings[0].line, Some(2));
    }

    #[tokio::test]
    async fn blocking_sleep_only_in_async_files() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _tx) = test_support::context(dir.path());
        let files = vec![
            test_support::discovered(
                dir.path(),
                "service.py",
                "async def poll():\n    time.sleep(5)\n",
            ),
            test_support::discovered(dir.path(), "script.py", "time.sleep(5)\n"),
        ];

        let findings = StressFrame::new().execute(&files, &ctx).await.unwrap();
        let blocking: Vec<_> = findings
            .iter()
            .filter(|f| f.rule_id.as_deref() == Some("blocking_sleep"))
            .collect();
        assert_eq!(blocking.len(), 1);
        assert!(blocking[0]
            .file_path
            .as_ref()
            .unwrap()
            .ends_with("service.py"));
    }

    #[tokio::test]
    async fn asyncio_sleep_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _tx) = test_support::context(dir.path());
        let files = vec![test_support::discovered(
            dir.path(),
            "service.py",
            "async def poll():\n    await asyncio.sleep(5)\n",
        )];

        let findings = StressFrame::new().execute(&files, &ctx).await.unwrap();
        assert!(findings.is_empty());
    }
}
