//! Discovery of installed frame bundles under `.warden/frames/`.
//!
//! Each bundle directory carries a `frame.yaml` manifest naming the frame
//! and its bundled rules; bundles execute through the rule engine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use super::custom::{compile_rules, CustomRuleFrame};
use super::{FrameMetadata, PipelinePhase};
use crate::config::Rule;
use crate::types::Priority;

/// Directory scanned for installed frames, relative to the project root
pub const FRAMES_DIR: &str = ".warden/frames";

/// Manifest at `.warden/frames/<name>/frame.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub is_blocker: bool,
    #[serde(default = "default_phase")]
    pub phase: PipelinePhase,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

fn default_priority() -> Priority {
    Priority::Medium
}

fn default_phase() -> PipelinePhase {
    PipelinePhase::Validation
}

impl FrameManifest {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    fn into_frame(self) -> CustomRuleFrame {
        let metadata = FrameMetadata {
            id: self.id,
            name: self.name,
            description: self.description,
            phase: self.phase,
            priority: self.priority,
            is_blocker: self.is_blocker,
            tags: self.tags,
            supported_languages: None,
            depends_on: vec![],
            parallel_safe: true,
        };
        let rules = compile_rules(&self.rules);
        CustomRuleFrame::with_metadata(metadata, rules)
    }
}

/// Scan the install directory and build a frame per valid manifest.
/// Broken bundles are skipped with a warning; they never fail startup.
pub fn load_installed_frames(root: &Path) -> Vec<CustomRuleFrame> {
    let frames_dir = root.join(FRAMES_DIR);
    let Ok(entries) = std::fs::read_dir(&frames_dir) else {
        return Vec::new();
    };

    let mut dirs: Vec<_> = entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .map(|e| e.path())
        .collect();
    dirs.sort();

    let mut frames = Vec::new();
    for dir in dirs {
        let manifest_path = dir.join("frame.yaml");
        if !manifest_path.exists() {
            warn!(
                "installed frame at {} has no frame.yaml, skipping",
                dir.display()
            );
            continue;
        }
        match FrameManifest::load(&manifest_path) {
            Ok(manifest) => {
                debug!("loaded installed frame '{}' v{}", manifest.id, manifest.version);
                frames.push(manifest.into_frame());
            }
            Err(e) => warn!("invalid frame manifest {}: {}", manifest_path.display(), e),
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::Frame;

    #[test]
    fn loads_manifest_from_bundle_dir() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join(".warden/frames/license-check");
        std::fs::create_dir_all(&bundle).unwrap();
        std::fs::write(
            bundle.join("frame.yaml"),
            r#"
id: license-check
name: License Check
version: 1.0.0
priority: low
rules:
  - id: gpl-marker
    name: GPL license marker
    severity: high
    pattern: 'GNU General Public License'
"#,
        )
        .unwrap();

        let frames = load_installed_frames(dir.path());
        assert_eq!(frames.len(), 1);
        let metadata = frames[0].metadata();
        assert_eq!(metadata.id, "license-check");
        assert_eq!(metadata.priority, Priority::Low);
    }

    #[test]
    fn broken_manifest_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join(".warden/frames/broken");
        std::fs::create_dir_all(&bundle).unwrap();
        std::fs::write(bundle.join("frame.yaml"), "id: [unclosed\n").unwrap();

        let frames = load_installed_frames(dir.path());
        assert!(frames.is_empty());
    }

    #[test]
    fn missing_install_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_installed_frames(dir.path()).is_empty());
    }
}
