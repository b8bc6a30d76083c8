//! Framework detection from manifest files and top-level imports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::DiscoveredFile;

/// Outcome of framework detection across the project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameworkDetectionResult {
    /// Highest-confidence framework, if any scored above zero
    pub primary: Option<String>,
    pub confidence: f64,
    /// All detected frameworks with their scores
    pub all: BTreeMap<String, f64>,
}

/// Dependency-name evidence inside package.json
const NODE_FRAMEWORKS: &[(&str, &str)] = &[
    ("next", "nextjs"),
    ("nuxt", "nuxt"),
    ("@angular/core", "angular"),
    ("vue", "vue"),
    ("react", "react"),
    ("express", "express"),
    ("fastify", "fastify"),
];

/// Import/requirement evidence for Python
const PYTHON_FRAMEWORKS: &[(&str, &str)] = &[
    ("django", "django"),
    ("flask", "flask"),
    ("fastapi", "fastapi"),
];

/// Scan manifests at the root and record evidence per framework.
pub fn detect_frameworks(root: &Path, files: &[DiscoveredFile]) -> FrameworkDetectionResult {
    let mut scores: BTreeMap<String, f64> = BTreeMap::new();

    if let Ok(content) = std::fs::read_to_string(root.join("package.json")) {
        if let Ok(manifest) = serde_json::from_str::<serde_json::Value>(&content) {
            let deps = ["dependencies", "devDependencies"]
                .iter()
                .filter_map(|k| manifest.get(k))
                .filter_map(|v| v.as_object())
                .flat_map(|m| m.keys().cloned())
                .collect::<Vec<_>>();
            for (needle, framework) in NODE_FRAMEWORKS {
                if deps.iter().any(|d| d == needle) {
                    *scores.entry(framework.to_string()).or_insert(0.0) += 0.6;
                }
            }
        }
    }

    for manifest in ["requirements.txt", "pyproject.toml", "Pipfile"] {
        if let Ok(content) = std::fs::read_to_string(root.join(manifest)) {
            let lower = content.to_ascii_lowercase();
            for (needle, framework) in PYTHON_FRAMEWORKS {
                if lower.contains(needle) {
                    *scores.entry(framework.to_string()).or_insert(0.0) += 0.6;
                }
            }
        }
    }

    if root.join("go.mod").exists() {
        *scores.entry("go".to_string()).or_insert(0.0) += 0.5;
    }
    if root.join("Cargo.toml").exists() {
        *scores.entry("rust".to_string()).or_insert(0.0) += 0.5;
    }
    for manifest in ["pom.xml", "build.gradle", "build.gradle.kts"] {
        if root.join(manifest).exists() {
            *scores.entry("jvm".to_string()).or_insert(0.0) += 0.5;
        }
    }

    // Top-level imports add weaker evidence
    for file in files.iter().filter(|f| f.is_analyzable).take(200) {
        if let Ok(content) = std::fs::read_to_string(&file.path) {
            let head: String = content.lines().take(30).collect::<Vec<_>>().join("\n");
            for (needle, framework) in PYTHON_FRAMEWORKS {
                if head.contains(&format!("import {}", needle))
                    || head.contains(&format!("from {}", needle))
                {
                    *scores.entry(framework.to_string()).or_insert(0.0) += 0.1;
                }
            }
        }
    }

    for score in scores.values_mut() {
        *score = score.min(1.0);
    }

    let primary = scores
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(name, _)| name.clone());
    let confidence = primary
        .as_ref()
        .and_then(|p| scores.get(p))
        .copied()
        .unwrap_or(0.0);

    if let Some(primary) = &primary {
        debug!(framework = %primary, confidence, "framework detected");
    }

    FrameworkDetectionResult {
        primary,
        confidence,
        all: scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_react_from_package_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"react": "^18.0.0", "react-dom": "^18.0.0"}}"#,
        )
        .unwrap();

        let result = detect_frameworks(dir.path(), &[]);
        assert_eq!(result.primary.as_deref(), Some("react"));
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn detects_fastapi_from_requirements() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("requirements.txt"),
            "fastapi==0.110.0\nuvicorn\n",
        )
        .unwrap();

        let result = detect_frameworks(dir.path(), &[]);
        assert_eq!(result.primary.as_deref(), Some("fastapi"));
    }

    #[test]
    fn empty_project_has_no_primary() {
        let dir = tempfile::tempdir().unwrap();
        let result = detect_frameworks(dir.path(), &[]);
        assert!(result.primary.is_none());
        assert_eq!(result.confidence, 0.0);
    }
}
