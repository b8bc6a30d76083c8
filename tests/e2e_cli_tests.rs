//! End-to-end CLI Tests
//!
//! Drives the compiled `warden` binary against fixture trees.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn warden() -> Command {
    let mut cmd = Command::cargo_bin("warden").expect("binary builds");
    // keep host CI environment out of the assertions
    for var in [
        "GITHUB_ACTIONS",
        "GITLAB_CI",
        "TF_BUILD",
        "JENKINS_HOME",
        "CIRCLECI",
        "TRAVIS",
        "GITHUB_OUTPUT",
        "GITHUB_ENV",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn scan_clean_tree_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.py", "def main():\n    return 0\n\nmain()\n");

    warden()
        .args(["scan", dir.path().to_str().unwrap(), "--frames", "security"])
        .assert()
        .success()
        .stdout(predicate::str::contains("success"));

    assert!(dir.path().join(".warden/ai_status.md").exists());
    let reports: Vec<_> = std::fs::read_dir(dir.path().join(".warden/reports"))
        .unwrap()
        .flatten()
        .collect();
    // scan-<ts>.json and scan-<ts>.md
    assert_eq!(reports.len(), 2);
}

#[test]
fn scan_with_secret_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "app.py",
        "api_key = \"sk_live_abcdef1234567890\"\n",
    );

    warden()
        .args(["scan", dir.path().to_str().unwrap(), "--frames", "security"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Hardcoded secret detected"));
}

#[test]
fn github_annotations_are_emitted_on_ci() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "app.py",
        "api_key = \"sk_live_abcdef1234567890\"\n",
    );

    warden()
        .args([
            "--quiet",
            "scan",
            dir.path().to_str().unwrap(),
            "--frames",
            "security",
        ])
        .env("GITHUB_ACTIONS", "true")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("::error file=app.py,line=1"));
}

#[test]
fn suppression_in_config_flips_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "app.py",
        "api_key = \"sk_live_abcdef1234567890\"\n",
    );
    write(
        dir.path(),
        ".warden/config.yaml",
        "suppressions:\n  - rule: \"security:secret:*\"\n    reason: fixture\n",
    );

    warden()
        .args(["scan", dir.path().to_str().unwrap(), "--frames", "security"])
        .assert()
        .success();
}

#[test]
fn sarif_format_prints_valid_document() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.py", "x = 1\n");

    let output = warden()
        .args([
            "--quiet",
            "scan",
            dir.path().to_str().unwrap(),
            "--frames",
            "security",
            "--format",
            "sarif",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let sarif: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON on stdout");
    assert_eq!(sarif["version"], "2.1.0");
    assert_eq!(sarif["runs"][0]["tool"]["driver"]["name"], "warden");
}

#[test]
fn fail_on_high_promotes_high_findings() {
    let dir = tempfile::tempdir().unwrap();
    // eval() is high severity, not critical
    write(dir.path(), "app.py", "result = eval(user_input)\n");

    warden()
        .args(["scan", dir.path().to_str().unwrap(), "--frames", "security"])
        .assert()
        .success();

    warden()
        .args([
            "scan",
            dir.path().to_str().unwrap(),
            "--frames",
            "security",
            "--fail-on",
            "high",
        ])
        .assert()
        .code(1);
}

#[test]
fn analyze_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("app.py");
    std::fs::write(&file, "password = \"hunter2-but-longer\"\n").unwrap();

    warden()
        .args(["analyze", file.to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Hardcoded secret detected"));
}

#[test]
fn frames_lists_builtins() {
    let dir = tempfile::tempdir().unwrap();
    warden()
        .args(["frames", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("security")
                .and(predicate::str::contains("orphan"))
                .and(predicate::str::contains("chaos"))
                .and(predicate::str::contains("stress"))
                .and(predicate::str::contains("contract")),
        );
}

#[test]
fn status_without_scan_is_pending() {
    let dir = tempfile::tempdir().unwrap();
    warden()
        .args(["status", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("PENDING"));
}

#[test]
fn status_after_scan_reports_pass() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.py", "x = 1\n");

    warden()
        .args(["scan", dir.path().to_str().unwrap(), "--frames", "security"])
        .assert()
        .success();
    warden()
        .args(["status", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("PASS"));
}

#[test]
fn install_is_idempotent_and_writes_lockfile() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "bundles/extra/frame.yaml",
        "id: extra\nname: Extra\nversion: 0.1.0\nrules:\n  - id: r1\n    name: R1\n    severity: low\n    pattern: 'XXX'\n",
    );
    write(
        dir.path(),
        ".warden/config.yaml",
        "frames:\n  install:\n    - name: extra\n      source: bundles/extra\n",
    );

    warden()
        .args(["install", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("installed: extra"));
    assert!(dir.path().join("warden.lock").exists());
    assert!(dir.path().join(".warden/frames/extra/frame.yaml").exists());

    warden()
        .args(["install", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date: extra"));

    // the installed frame now participates in scans
    warden()
        .args(["frames", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("extra"));
}

#[test]
fn invalid_config_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".warden/config.yaml", "platforms: [not: [valid\n");

    warden()
        .args(["scan", dir.path().to_str().unwrap()])
        .assert()
        .code(2);
}
