//! Directory walk with confidence-scored platform classification.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::signatures::{builtin_signatures, PlatformSignature};
use super::{DetectedProject, PlatformRole, PlatformType};

const FILE_PRESENCE_WEIGHT: f64 = 0.4;
const CONTENT_MATCH_WEIGHT: f64 = 0.6;
const EXCLUSION_PENALTY: f64 = 0.25;

const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    "vendor",
];

#[derive(Debug, Clone)]
pub struct DetectorOptions {
    pub max_depth: usize,
    pub confidence_threshold: f64,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            confidence_threshold: 0.3,
        }
    }
}

/// Detect projects under `root`. On duplicate paths across signatures the
/// highest-confidence classification wins.
pub fn detect_projects(root: &Path, options: &DetectorOptions) -> Vec<DetectedProject> {
    let signatures = builtin_signatures();
    let mut by_path: HashMap<PathBuf, DetectedProject> = HashMap::new();

    let walker = WalkDir::new(root)
        .max_depth(options.max_depth)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            !e.file_type().is_dir()
                || !EXCLUDED_DIRS.contains(&e.file_name().to_string_lossy().as_ref())
        });

    for entry in walker.flatten() {
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        for signature in &signatures {
            let Some((confidence, evidence)) = score_signature(dir, signature) else {
                continue;
            };
            if confidence < options.confidence_threshold {
                continue;
            }
            let project = DetectedProject {
                name: dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "root".to_string()),
                path: dir.to_path_buf(),
                platform_type: signature.platform_type,
                role: suggest_role(dir, signature),
                confidence,
                evidence,
                metadata: HashMap::new(),
            };
            match by_path.get(dir) {
                Some(existing) if existing.confidence >= project.confidence => {}
                _ => {
                    debug!(
                        path = %dir.display(),
                        platform = signature.platform_type.as_str(),
                        confidence,
                        "platform detected"
                    );
                    by_path.insert(dir.to_path_buf(), project);
                }
            }
        }
    }

    let mut projects: Vec<DetectedProject> = by_path.into_values().collect();
    projects.sort_by(|a, b| a.path.cmp(&b.path));
    projects
}

/// Score one signature against a directory. Returns `None` when no marker
/// file is present at all.
fn score_signature(dir: &Path, signature: &PlatformSignature) -> Option<(f64, Vec<String>)> {
    let mut evidence = Vec::new();

    let present = signature
        .marker_files
        .iter()
        .filter(|f| dir.join(f).exists())
        .inspect(|f| evidence.push(format!("file: {}", f)))
        .count();
    if present == 0 {
        return None;
    }
    let file_score = present as f64 / signature.marker_files.len() as f64;

    let content_score = if signature.content_markers.is_empty() {
        // no content evidence defined; presence carries the whole score
        file_score
    } else {
        let matched = signature
            .content_markers
            .iter()
            .filter(|(file, needle)| {
                std::fs::read_to_string(dir.join(file))
                    .map(|content| content.to_ascii_lowercase().contains(&needle.to_ascii_lowercase()))
                    .unwrap_or(false)
            })
            .inspect(|(file, needle)| evidence.push(format!("content: {} in {}", needle, file)))
            .count();
        matched as f64 / signature.content_markers.len() as f64
    };

    let exclusions_hit = signature
        .exclusions
        .iter()
        .filter(|f| dir.join(f).exists())
        .count();

    let score = (file_score * FILE_PRESENCE_WEIGHT + content_score * CONTENT_MATCH_WEIGHT)
        * signature.weight_multiplier
        - exclusions_hit as f64 * EXCLUSION_PENALTY;

    Some((score.clamp(0.0, 1.0), evidence))
}

/// Mobile and front-end platforms consume; backend frameworks provide; BFF
/// layouts (Next.js `/api`, Nuxt `/server`) do both.
fn suggest_role(dir: &Path, signature: &PlatformSignature) -> PlatformRole {
    match signature.platform_type {
        PlatformType::Nextjs => {
            if dir.join("pages/api").is_dir() || dir.join("app/api").is_dir() {
                PlatformRole::Both
            } else {
                PlatformRole::Consumer
            }
        }
        PlatformType::Nuxt => {
            if dir.join("server").is_dir() {
                PlatformRole::Both
            } else {
                PlatformRole::Consumer
            }
        }
        _ => signature.default_role,
    }
}
