//! # Frame Installer
//!
//! Installs frame bundles declared in project config into
//! `.warden/frames/`, recording SHA-256 content hashes in `warden.lock`.
//! Installation is idempotent: a bundle whose lock hash matches its source
//! is left alone unless `--force-update` is passed. Bundles are staged
//! under `.warden/staging/` and moved into place only when complete.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::FrameInstallSpec;

/// Lockfile name at the project root
pub const LOCKFILE_PATH: &str = "warden.lock";
const STAGING_DIR: &str = ".warden/staging";
const FRAMES_DIR: &str = ".warden/frames";

/// `warden.lock` contents: frame name to content hash, sorted for stable
/// serialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    pub frames: BTreeMap<String, LockEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockEntry {
    pub version: String,
    pub sha256: String,
}

impl Lockfile {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(LOCKFILE_PATH);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = root.join(LOCKFILE_PATH);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Outcome of one `warden install` run
#[derive(Debug, Default)]
pub struct InstallSummary {
    pub installed: Vec<String>,
    pub up_to_date: Vec<String>,
    pub failed: Vec<String>,
}

/// Install every frame declared in config. Sources are local directories
/// containing a `frame.yaml`; fetching remote bundles is outside this
/// installer.
pub fn install_frames(
    root: &Path,
    specs: &[FrameInstallSpec],
    force_update: bool,
) -> Result<InstallSummary> {
    let mut lockfile = Lockfile::load(root)?;
    let mut summary = InstallSummary::default();

    for spec in specs {
        match install_one(root, spec, &mut lockfile, force_update) {
            Ok(true) => summary.installed.push(spec.name.clone()),
            Ok(false) => summary.up_to_date.push(spec.name.clone()),
            Err(e) => {
                warn!("failed to install frame '{}': {}", spec.name, e);
                summary.failed.push(spec.name.clone());
            }
        }
    }

    lockfile.save(root)?;
    Ok(summary)
}

/// Returns `Ok(true)` when the bundle was (re)installed, `Ok(false)` when
/// the lock hash already matches.
fn install_one(
    root: &Path,
    spec: &FrameInstallSpec,
    lockfile: &mut Lockfile,
    force_update: bool,
) -> Result<bool> {
    let source = if spec.source.is_absolute() {
        spec.source.clone()
    } else {
        root.join(&spec.source)
    };
    if !source.is_dir() {
        anyhow::bail!("source directory does not exist: {}", source.display());
    }
    let manifest_path = source.join("frame.yaml");
    if !manifest_path.exists() {
        anyhow::bail!("source has no frame.yaml: {}", source.display());
    }

    let hash = hash_bundle(&source)?;
    let manifest: crate::frames::installed::FrameManifest =
        crate::frames::installed::FrameManifest::load(&manifest_path)?;

    let target = root.join(FRAMES_DIR).join(&spec.name);
    if !force_update && target.is_dir() {
        if let Some(entry) = lockfile.frames.get(&spec.name) {
            if entry.sha256 == hash {
                return Ok(false);
            }
        }
    }

    // stage, then move into place
    let staging_root = root.join(STAGING_DIR);
    std::fs::create_dir_all(&staging_root)?;
    let staging = tempfile::tempdir_in(&staging_root)?;
    copy_dir(&source, staging.path())?;

    if target.exists() {
        std::fs::remove_dir_all(&target)?;
    }
    std::fs::create_dir_all(target.parent().expect("frames dir has a parent"))?;
    let staged = staging.into_path();
    std::fs::rename(&staged, &target)
        .with_context(|| format!("failed to move staged bundle into {}", target.display()))?;

    lockfile.frames.insert(
        spec.name.clone(),
        LockEntry {
            version: manifest.version,
            sha256: hash,
        },
    );
    info!("installed frame '{}'", spec.name);
    Ok(true)
}

/// SHA-256 over the bundle's file names and contents in sorted order.
fn hash_bundle(dir: &Path) -> Result<String> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    let mut hasher = Sha256::new();
    for file in files {
        let rel = file.strip_prefix(dir).unwrap_or(&file);
        hasher.update(rel.to_string_lossy().as_bytes());
        hasher.update([0]);
        hasher.update(std::fs::read(&file)?);
        hasher.update([0]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(from) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(from)?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let dest = to.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
