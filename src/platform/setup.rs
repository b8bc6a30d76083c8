//! Validation and persistence of generated platform configuration.

use std::path::Path;
use tracing::info;

use super::{DetectedProject, PlatformRole};
use crate::config::validation::ValidationResult;
use crate::config::{deep_merge, CONFIG_PATH};

/// Files above this count trigger a size warning for a platform directory
const LARGE_PROJECT_FILE_COUNT: usize = 10_000;

/// Validate detected projects before persisting them as platform config.
pub fn validate_projects(projects: &[DetectedProject], contract_enabled: bool) -> ValidationResult {
    let mut result = ValidationResult::default();

    for project in projects {
        if project.name.is_empty() {
            result.error("platforms", "platform name must not be empty");
        }
        if !project.path.exists() {
            result.error(
                "platforms",
                format!("platform path does not exist: {}", project.path.display()),
            );
        } else if !project.path.is_dir() {
            result.error(
                "platforms",
                format!(
                    "platform path is not a directory: {}",
                    project.path.display()
                ),
            );
        } else if file_count_exceeds(&project.path, LARGE_PROJECT_FILE_COUNT) {
            result.warning(
                "platforms",
                format!(
                    "platform '{}' has more than {} files; scans may be slow",
                    project.name, LARGE_PROJECT_FILE_COUNT
                ),
            );
        }
    }

    if contract_enabled {
        let has_consumer = projects
            .iter()
            .any(|p| matches!(p.role, PlatformRole::Consumer | PlatformRole::Both));
        let has_provider = projects
            .iter()
            .any(|p| matches!(p.role, PlatformRole::Provider | PlatformRole::Both));
        if !(has_consumer && has_provider) {
            result.warning(
                "platforms",
                "contract frame is enabled but platforms do not include both a consumer and a provider",
            );
        }
    }

    result
}

fn file_count_exceeds(path: &Path, limit: usize) -> bool {
    walkdir::WalkDir::new(path)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .take(limit + 1)
        .count()
        > limit
}

/// Persist detected platforms into `.warden/config.yaml`, deep-merging with
/// any existing config so other top-level keys survive. The previous file is
/// copied to `.backup` first.
pub fn persist_platforms(root: &Path, projects: &[DetectedProject]) -> anyhow::Result<()> {
    let config_path = root.join(CONFIG_PATH);

    let platforms: Vec<serde_yaml::Value> = projects
        .iter()
        .map(|p| {
            let rel = p.path.strip_prefix(root).unwrap_or(&p.path);
            serde_yaml::to_value(serde_yaml::Mapping::from_iter([
                ("name".into(), serde_yaml::Value::from(p.name.clone())),
                (
                    "path".into(),
                    serde_yaml::Value::from(rel.to_string_lossy().into_owned()),
                ),
                (
                    "type".into(),
                    serde_yaml::Value::from(p.platform_type.as_str()),
                ),
                (
                    "role".into(),
                    serde_yaml::to_value(p.role).expect("role serializes"),
                ),
            ]))
            .expect("platform serializes")
        })
        .collect();

    let mut generated = serde_yaml::Mapping::new();
    generated.insert("platforms".into(), serde_yaml::Value::Sequence(platforms));
    let generated = serde_yaml::Value::Mapping(generated);

    let merged = if config_path.exists() {
        let existing = std::fs::read_to_string(&config_path)?;
        let backup_path = config_path.with_extension("yaml.backup");
        std::fs::write(&backup_path, &existing)?;
        info!("backed up existing config to {}", backup_path.display());
        let existing_value: serde_yaml::Value = serde_yaml::from_str(&existing)?;
        deep_merge(existing_value, generated)
    } else {
        generated
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&config_path, serde_yaml::to_string(&merged)?)?;
    info!("wrote platform config to {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformType;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn project(path: PathBuf, role: PlatformRole) -> DetectedProject {
        DetectedProject {
            name: "demo".to_string(),
            path,
            platform_type: PlatformType::Fastapi,
            role,
            confidence: 0.8,
            evidence: vec![],
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn missing_path_is_an_error() {
        let projects = vec![project(PathBuf::from("/nonexistent/xyz"), PlatformRole::Provider)];
        let result = validate_projects(&projects, false);
        assert!(result.has_errors());
    }

    #[test]
    fn contract_frame_needs_both_roles() {
        let dir = tempfile::tempdir().unwrap();
        let projects = vec![project(dir.path().to_path_buf(), PlatformRole::Provider)];
        let result = validate_projects(&projects, true);
        assert!(!result.has_errors());
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn persist_preserves_existing_keys_and_writes_backup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".warden")).unwrap();
        std::fs::write(
            dir.path().join(".warden/config.yaml"),
            "pipeline_name: existing\nthresholds:\n  fail_on_high: true\n",
        )
        .unwrap();

        let projects = vec![project(dir.path().to_path_buf(), PlatformRole::Provider)];
        persist_platforms(dir.path(), &projects).unwrap();

        assert!(dir.path().join(".warden/config.yaml.backup").exists());
        let written = std::fs::read_to_string(dir.path().join(".warden/config.yaml")).unwrap();
        let config: crate::config::Config = serde_yaml::from_str(&written).unwrap();
        assert_eq!(config.pipeline_name.as_deref(), Some("existing"));
        assert!(config.thresholds.fail_on_high);
        assert_eq!(config.platforms.len(), 1);
    }
}
