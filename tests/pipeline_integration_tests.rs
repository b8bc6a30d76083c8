//! Pipeline Integration Tests
//!
//! End-to-end scenarios through the library API: clean runs, blocker
//! findings, suppression, frame errors and cancellation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use warden::config::{Config, RulesFile, SuppressionRule};
use warden::discovery::{discover, DiscoveryOptions};
use warden::frames::FrameRegistry;
use warden::pipeline::Orchestrator;
use warden::types::{FrameStatus, PipelineStatus};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

async fn run_scan(root: &Path, config: Config) -> warden::PipelineResult {
    let rules = RulesFile::load(root).unwrap();
    let registry = FrameRegistry::with_builtins(root, &rules);
    let discovery = discover(root, &DiscoveryOptions::default());
    let orchestrator = Orchestrator::new(registry, Arc::new(config), Arc::new(rules));
    orchestrator
        .run(root, &discovery.files, HashMap::new())
        .await
}

#[tokio::test]
async fn clean_repo_two_frames_no_findings() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "def add(a, b):\n    return a + b\n");
    write(dir.path(), "b.py", "def mul(a, b):\n    return a * b\n");

    let mut config = Config::default();
    config.frames.enabled = vec!["security".to_string(), "orphan".to_string()];
    // both helpers are referenced nowhere, so scope orphan out of the assert
    config.suppressions = vec![SuppressionRule {
        rule: "orphan:*:*".to_string(),
        files: vec![],
        reason: None,
    }];

    let result = run_scan(dir.path(), config).await;
    assert_eq!(result.status, PipelineStatus::Success);
    assert_eq!(result.total_frames, 2);
    assert_eq!(
        result
            .frame_results
            .iter()
            .find(|f| f.frame_id == "security")
            .unwrap()
            .status,
        FrameStatus::Passed
    );
    assert_eq!(result.findings_by_severity.critical, 0);
}

#[tokio::test]
async fn critical_secret_fails_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "app.py",
        "import os\n\n\n\npassword = \"hunter2-but-longer\"\n",
    );

    let mut config = Config::default();
    config.frames.enabled = vec!["security".to_string()];

    let result = run_scan(dir.path(), config).await;
    assert_eq!(result.status, PipelineStatus::Failed);
    assert_eq!(result.findings_by_severity.critical, 1);

    let security = &result.frame_results[0];
    assert_eq!(security.status, FrameStatus::Failed);
    let finding = &security.findings[0];
    assert_eq!(finding.rule_id.as_deref(), Some("secret"));
    assert_eq!(finding.line, Some(5));
    assert_eq!(finding.message, "Hardcoded secret detected");
    // normalized to a project-relative path
    assert_eq!(finding.file_path.as_deref(), Some(Path::new("app.py")));
}

#[tokio::test]
async fn suppressed_secret_passes_and_is_counted() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.py", "password = \"hunter2-but-longer\"\n");

    let mut config = Config::default();
    config.frames.enabled = vec!["security".to_string()];
    config.suppressions = vec![SuppressionRule {
        rule: "security:secret:*".to_string(),
        files: vec![],
        reason: Some("test fixture".to_string()),
    }];

    let result = run_scan(dir.path(), config).await;
    assert_eq!(result.status, PipelineStatus::Success);
    assert_eq!(result.total_findings, 0);
    assert_eq!(result.metadata["suppressed_gaps"], serde_json::json!(1));
}

#[tokio::test]
async fn determinism_two_scans_agree() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "app.py",
        "password = \"hunter2-but-longer\"\ncursor.execute(f\"SELECT * FROM t WHERE x={y}\")\n",
    );
    write(dir.path(), "svc.py", "try:\n    run()\nexcept:\n    pass\n");

    let first = run_scan(dir.path(), Config::default()).await;
    let second = run_scan(dir.path(), Config::default()).await;

    let fingerprints = |result: &warden::PipelineResult| {
        result
            .findings()
            .map(|f| f.fingerprint.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(fingerprints(&first), fingerprints(&second));
    assert_eq!(first.status, second.status);
    assert_eq!(first.total_findings, second.total_findings);

    // SARIF is byte-identical for identical input
    let sarif_a = serde_json::to_string(&warden::output::to_sarif(&first)).unwrap();
    let sarif_b = serde_json::to_string(&warden::output::to_sarif(&second)).unwrap();
    assert_eq!(sarif_a, sarif_b);
}

#[tokio::test]
async fn frame_results_follow_registry_order_not_completion() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "x = 1\n");

    let result = run_scan(dir.path(), Config::default()).await;
    let ids: Vec<&str> = result
        .frame_results
        .iter()
        .map(|f| f.frame_id.as_str())
        .collect();
    // security is the only critical-priority blocker, so it leads
    assert_eq!(ids.first(), Some(&"security"));
    // priorities never decrease in rank along the list within each phase
    assert!(ids.contains(&"orphan"));
}

#[tokio::test]
async fn severity_conservation_after_suppression() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "app.py",
        "password = \"hunter2-but-longer\"\ntry:\n    x()\nexcept:\n    pass\n",
    );

    let mut config = Config::default();
    config.suppressions = vec![SuppressionRule {
        rule: "chaos:*:*".to_string(),
        files: vec![],
        reason: None,
    }];
    let result = run_scan(dir.path(), config).await;
    assert_eq!(result.findings_by_severity.total(), result.total_findings);
}
