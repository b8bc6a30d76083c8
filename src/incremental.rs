//! # Incremental Selector
//!
//! Shrinks the scan scope to git-changed files plus dependency-adjacent
//! siblings when `--diff` is requested. Any git failure downgrades to a full
//! scan; the selector never fails the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::config::IncrementalConfig;
use crate::discovery::DiscoveredFile;
use crate::error::{Result, WardenError};

/// Per-file change statistics from `git diff --numstat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub path: PathBuf,
    pub lines_added: u32,
    pub lines_deleted: u32,
    pub binary: bool,
}

/// Files changed relative to the base ref
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: Vec<FileChange>,
    pub modified: Vec<FileChange>,
    pub deleted: Vec<PathBuf>,
    pub renamed: Vec<(PathBuf, PathBuf)>,
}

impl ChangeSet {
    /// Paths that still exist and are candidates for scanning
    pub fn scannable_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.added
            .iter()
            .chain(self.modified.iter())
            .map(|c| &c.path)
            .chain(self.renamed.iter().map(|(_, to)| to))
    }
}

/// Outcome of incremental selection
#[derive(Debug, Clone)]
pub struct IncrementalSelection {
    pub files: Vec<DiscoveredFile>,
    /// 1 - selected/total, as a percentage
    pub reduction_percentage: f64,
    pub changeset: Option<ChangeSet>,
    pub base_ref: String,
}

/// Resolve the diff base from CI environment variables, falling back to
/// `HEAD~1`. GitHub, GitLab and Azure expose the PR target branch.
pub fn detect_base_ref() -> String {
    for var in [
        "GITHUB_BASE_REF",
        "CI_MERGE_REQUEST_TARGET_BRANCH_NAME",
        "SYSTEM_PULLREQUEST_TARGETBRANCH",
    ] {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() {
                return value;
            }
        }
    }
    "HEAD~1".to_string()
}

/// Select the subset of discovered files to scan for the given base ref.
///
/// On any git failure the full discovered set is returned with a 0%
/// reduction, per the incremental-safety contract.
pub fn select_files(
    root: &Path,
    discovered: &[DiscoveredFile],
    base_ref: Option<&str>,
    config: &IncrementalConfig,
) -> IncrementalSelection {
    let base = base_ref
        .map(String::from)
        .unwrap_or_else(detect_base_ref);

    let changeset = match compute_changeset(root, &base) {
        Ok(changeset) => changeset,
        Err(e) => {
            info!("incremental selection unavailable ({}), scanning all files", e);
            return IncrementalSelection {
                files: discovered.to_vec(),
                reduction_percentage: 0.0,
                changeset: None,
                base_ref: base,
            };
        }
    };

    let mut selected: BTreeSet<PathBuf> = changeset
        .scannable_paths()
        .map(|p| root.join(p))
        .collect();

    // untracked files are changes too
    if let Ok(untracked) = untracked_files(root) {
        selected.extend(untracked.into_iter().map(|p| root.join(p)));
    }

    if config.include_siblings {
        expand_siblings(&mut selected, discovered);
    }

    let files: Vec<DiscoveredFile> = discovered
        .iter()
        .filter(|f| selected.contains(&f.path))
        .filter(|f| extension_allowed(&f.path, &config.extensions))
        .cloned()
        .collect();

    let total = discovered.len().max(1);
    let reduction_percentage = (1.0 - files.len() as f64 / total as f64) * 100.0;
    debug!(
        selected = files.len(),
        total = discovered.len(),
        reduction = reduction_percentage,
        "incremental selection"
    );

    IncrementalSelection {
        files,
        reduction_percentage,
        changeset: Some(changeset),
        base_ref: base,
    }
}

/// Parse `git diff --numstat` against the base ref
pub fn compute_changeset(root: &Path, base_ref: &str) -> Result<ChangeSet> {
    let output = Command::new("git")
        .current_dir(root)
        .args(["diff", "--numstat", "--find-renames", base_ref])
        .output()
        .map_err(|e| WardenError::git(format!("failed to run git: {}", e)))?;

    if !output.status.success() {
        return Err(WardenError::git(format!(
            "git diff against '{}' failed: {}",
            base_ref,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(parse_numstat(&String::from_utf8_lossy(&output.stdout)))
}

/// `git diff --numstat` line format: `added\tdeleted\tpath`, with `-\t-` for
/// binary files and `old => new` (or `prefix{old => new}suffix`) for renames.
pub fn parse_numstat(output: &str) -> ChangeSet {
    let mut changeset = ChangeSet::default();

    for line in output.lines() {
        let mut parts = line.splitn(3, '\t');
        let (Some(added), Some(deleted), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };

        let binary = added == "-" && deleted == "-";
        let lines_added = added.parse::<u32>().unwrap_or(0);
        let lines_deleted = deleted.parse::<u32>().unwrap_or(0);

        if let Some((from, to)) = parse_rename(path) {
            changeset.renamed.push((from.clone(), to.clone()));
            changeset.modified.push(FileChange {
                path: to,
                lines_added,
                lines_deleted,
                binary,
            });
            continue;
        }

        let change = FileChange {
            path: PathBuf::from(path),
            lines_added,
            lines_deleted,
            binary,
        };
        // numstat does not distinguish add from modify; a file that is all
        // additions and no deletions is treated as added
        if lines_deleted == 0 && lines_added > 0 {
            changeset.added.push(change);
        } else {
            changeset.modified.push(change);
        }
    }

    changeset
}

fn parse_rename(path: &str) -> Option<(PathBuf, PathBuf)> {
    if let (Some(open), Some(close)) = (path.find('{'), path.find('}')) {
        let inner = &path[open + 1..close];
        let (from_part, to_part) = inner.split_once(" => ")?;
        let prefix = &path[..open];
        let suffix = &path[close + 1..];
        return Some((
            PathBuf::from(format!("{}{}{}", prefix, from_part, suffix)),
            PathBuf::from(format!("{}{}{}", prefix, to_part, suffix)),
        ));
    }
    let (from, to) = path.split_once(" => ")?;
    Some((PathBuf::from(from), PathBuf::from(to)))
}

fn untracked_files(root: &Path) -> Result<Vec<PathBuf>> {
    let output = Command::new("git")
        .current_dir(root)
        .args(["ls-files", "--others", "--exclude-standard"])
        .output()
        .map_err(|e| WardenError::git(format!("failed to run git: {}", e)))?;

    if !output.status.success() {
        return Err(WardenError::git("git ls-files failed"));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Add same-directory files with the same extension as any selected file,
/// to catch dependency-adjacent breakage.
fn expand_siblings(selected: &mut BTreeSet<PathBuf>, discovered: &[DiscoveredFile]) {
    let seeds: Vec<(PathBuf, Option<std::ffi::OsString>)> = selected
        .iter()
        .filter_map(|p| {
            p.parent()
                .map(|dir| (dir.to_path_buf(), p.extension().map(|e| e.to_os_string())))
        })
        .collect();

    for file in discovered {
        let Some(parent) = file.path.parent() else {
            continue;
        };
        let ext = file.path.extension().map(|e| e.to_os_string());
        if seeds
            .iter()
            .any(|(dir, seed_ext)| dir == parent && *seed_ext == ext)
        {
            selected.insert(file.path.clone());
        }
    }
}

fn extension_allowed(path: &Path, whitelist: &[String]) -> bool {
    if whitelist.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| whitelist.iter().any(|w| w.trim_start_matches('.') == ext))
        .unwrap_or(false)
}
