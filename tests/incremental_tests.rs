//! Incremental Selector Tests
//!
//! Real git repositories built in temp dirs: changed-file selection,
//! sibling expansion, reduction reporting and the full-scan fallback.

use std::path::Path;
use std::process::Command;

use serial_test::serial;
use warden::config::IncrementalConfig;
use warden::discovery::{discover, DiscoveryOptions};
use warden::incremental::{detect_base_ref, select_files};

fn git(root: &Path, args: &[&str]) {
    let status = Command::new("git")
        .current_dir(root)
        .args(args)
        .env("GIT_AUTHOR_NAME", "test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .expect("git runs");
    assert!(status.success(), "git {:?} failed", args);
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn setup_repo(root: &Path) {
    git(root, &["init", "--quiet", "--initial-branch=main"]);
    for i in 0..20 {
        write(root, &format!("src/mod{}.py", i), "x = 1\n");
    }
    write(root, "lib/util.py", "y = 2\n");
    git(root, &["add", "."]);
    git(root, &["commit", "--quiet", "-m", "initial"]);
}

#[test]
fn selects_only_changed_files_plus_siblings() {
    let dir = tempfile::tempdir().unwrap();
    setup_repo(dir.path());

    write(dir.path(), "src/mod3.py", "x = 1\nchanged = True\n");
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "--quiet", "-m", "change"]);

    let discovery = discover(dir.path(), &DiscoveryOptions::default());
    let selection = select_files(
        dir.path(),
        &discovery.files,
        Some("HEAD~1"),
        &IncrementalConfig {
            include_siblings: false,
            extensions: vec![],
        },
    );

    assert_eq!(selection.files.len(), 1);
    assert!(selection.files[0].path.ends_with("src/mod3.py"));
    assert!(selection.reduction_percentage > 90.0);
    assert!(selection.changeset.is_some());
}

#[test]
fn sibling_expansion_pulls_same_dir_same_extension() {
    let dir = tempfile::tempdir().unwrap();
    setup_repo(dir.path());

    write(dir.path(), "src/mod3.py", "x = 1\nchanged = True\n");
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "--quiet", "-m", "change"]);

    let discovery = discover(dir.path(), &DiscoveryOptions::default());
    let selection = select_files(
        dir.path(),
        &discovery.files,
        Some("HEAD~1"),
        &IncrementalConfig::default(),
    );

    // all of src/ shares the extension, lib/util.py does not join
    assert_eq!(selection.files.len(), 20);
    assert!(selection
        .files
        .iter()
        .all(|f| f.path.parent().unwrap().ends_with("src")));
}

#[test]
fn untracked_files_are_selected() {
    let dir = tempfile::tempdir().unwrap();
    setup_repo(dir.path());

    write(dir.path(), "brand_new.py", "z = 3\n");

    let discovery = discover(dir.path(), &DiscoveryOptions::default());
    let selection = select_files(
        dir.path(),
        &discovery.files,
        Some("HEAD"),
        &IncrementalConfig {
            include_siblings: false,
            extensions: vec![],
        },
    );
    assert_eq!(selection.files.len(), 1);
    assert!(selection.files[0].path.ends_with("brand_new.py"));
}

#[test]
fn unresolvable_base_falls_back_to_full_scan() {
    let dir = tempfile::tempdir().unwrap();
    setup_repo(dir.path());

    let discovery = discover(dir.path(), &DiscoveryOptions::default());
    let selection = select_files(
        dir.path(),
        &discovery.files,
        Some("no-such-ref"),
        &IncrementalConfig::default(),
    );
    assert_eq!(selection.files.len(), discovery.files.len());
    assert_eq!(selection.reduction_percentage, 0.0);
}

#[test]
fn non_repo_falls_back_to_full_scan() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "x = 1\n");
    write(dir.path(), "b.py", "y = 2\n");

    let discovery = discover(dir.path(), &DiscoveryOptions::default());
    let selection = select_files(
        dir.path(),
        &discovery.files,
        Some("HEAD~1"),
        &IncrementalConfig::default(),
    );
    assert_eq!(selection.files.len(), 2);
    assert!(selection.changeset.is_none());
}

#[test]
#[serial]
fn base_ref_prefers_github_env() {
    std::env::set_var("GITHUB_BASE_REF", "main");
    assert_eq!(detect_base_ref(), "main");
    std::env::remove_var("GITHUB_BASE_REF");
}

#[test]
#[serial]
fn base_ref_gitlab_and_azure_fallbacks() {
    std::env::remove_var("GITHUB_BASE_REF");
    std::env::set_var("CI_MERGE_REQUEST_TARGET_BRANCH_NAME", "develop");
    assert_eq!(detect_base_ref(), "develop");
    std::env::remove_var("CI_MERGE_REQUEST_TARGET_BRANCH_NAME");

    std::env::set_var("SYSTEM_PULLREQUEST_TARGETBRANCH", "release");
    assert_eq!(detect_base_ref(), "release");
    std::env::remove_var("SYSTEM_PULLREQUEST_TARGETBRANCH");

    assert_eq!(detect_base_ref(), "HEAD~1");
}
