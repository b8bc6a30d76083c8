//! Contract frame: cross-platform API contract checks driven by the
//! configured platforms and the platform detector.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use super::{Frame, FrameContext, FrameMetadata, PipelinePhase};
use crate::discovery::DiscoveredFile;
use crate::error::{Result, WardenError};
use crate::platform::{detect_projects, DetectorOptions, PlatformRole};
use crate::types::{Finding, Priority, Severity};

/// File names treated as API spec documents for provider platforms
const SPEC_FILES: &[&str] = &[
    "openapi.yaml",
    "openapi.yml",
    "openapi.json",
    "swagger.yaml",
    "swagger.json",
    "api.yaml",
];

pub struct ContractFrame {
    metadata: FrameMetadata,
}

impl ContractFrame {
    pub fn new() -> Self {
        Self {
            metadata: FrameMetadata {
                id: "contract".to_string(),
                name: "Contract".to_string(),
                description: "Validates platform configuration and provider API specs".to_string(),
                phase: PipelinePhase::Validation,
                priority: Priority::High,
                is_blocker: false,
                tags: vec!["contract".to_string()],
                supported_languages: None,
                depends_on: vec![],
                parallel_safe: false,
            },
        }
    }

    fn find_spec_file(platform_path: &Path) -> Option<std::path::PathBuf> {
        SPEC_FILES
            .iter()
            .map(|name| platform_path.join(name))
            .chain(SPEC_FILES.iter().map(|name| platform_path.join("docs").join(name)))
            .find(|p| p.exists())
    }

    /// Collect operationIds from an OpenAPI document (YAML or JSON)
    fn spec_operations(spec_path: &Path) -> Vec<String> {
        let Ok(content) = std::fs::read_to_string(spec_path) else {
            return Vec::new();
        };
        let value: Option<serde_yaml::Value> = serde_yaml::from_str(&content).ok();
        let Some(value) = value else {
            return Vec::new();
        };
        let mut operations = Vec::new();
        collect_operation_ids(&value, &mut operations);
        operations.sort();
        operations.dedup();
        operations
    }
}

fn collect_operation_ids(value: &serde_yaml::Value, out: &mut Vec<String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, inner) in map {
                if key.as_str() == Some("operationId") {
                    if let Some(id) = inner.as_str() {
                        out.push(id.to_string());
                    }
                }
                collect_operation_ids(inner, out);
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for inner in seq {
                collect_operation_ids(inner, out);
            }
        }
        _ => {}
    }
}

impl Default for ContractFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Frame for ContractFrame {
    fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    async fn execute(&self, batch: &[DiscoveredFile], ctx: &FrameContext) -> Result<Vec<Finding>> {
        let platforms = &ctx.config.platforms;
        if platforms.is_empty() {
            info!("contract frame has no platforms configured; nothing to check");
            return Ok(Vec::new());
        }

        let mut findings = Vec::new();

        for platform in platforms {
            if ctx.is_cancelled() {
                return Err(WardenError::Cancelled);
            }
            let platform_path = ctx.root.join(&platform.path);
            if !platform_path.is_dir() {
                findings.push(
                    Finding::new(
                        "contract",
                        Severity::High,
                        format!(
                            "Platform '{}' path does not exist: {}",
                            platform.name,
                            platform.path.display()
                        ),
                    )
                    .with_rule("platform_missing")
                    .with_metadata("target", serde_json::json!(platform.name)),
                );
                continue;
            }

            // declared type should agree with what the detector sees
            let detected = detect_projects(
                &platform_path,
                &DetectorOptions {
                    max_depth: 1,
                    ..DetectorOptions::default()
                },
            );
            let type_matches = detected
                .iter()
                .any(|p| p.platform_type == platform.platform_type);
            if !detected.is_empty() && !type_matches {
                findings.push(
                    Finding::new(
                        "contract",
                        Severity::Medium,
                        format!(
                            "Platform '{}' declares type {} but looks like {}",
                            platform.name,
                            platform.platform_type.as_str(),
                            detected[0].platform_type.as_str()
                        ),
                    )
                    .with_rule("platform_mismatch")
                    .with_metadata("target", serde_json::json!(platform.name)),
                );
            }

            if matches!(platform.role, PlatformRole::Provider | PlatformRole::Both) {
                match Self::find_spec_file(&platform_path) {
                    None => {
                        findings.push(
                            Finding::new(
                                "contract",
                                Severity::Medium,
                                format!(
                                    "Provider '{}' has no API spec document",
                                    platform.name
                                ),
                            )
                            .with_rule("missing_spec")
                            .with_metadata("target", serde_json::json!(platform.name)),
                        );
                    }
                    Some(spec_path) => {
                        // operations no consumer file references are likely dead surface
                        let operations = Self::spec_operations(&spec_path);
                        for operation in operations {
                            let referenced = batch.iter().filter(|f| f.is_analyzable).any(|f| {
                                std::fs::read_to_string(&f.path)
                                    .map(|c| c.contains(&operation))
                                    .unwrap_or(false)
                            });
                            if !referenced {
                                findings.push(
                                    Finding::new(
                                        "contract",
                                        Severity::Low,
                                        format!(
                                            "Operation '{}' is specified but never referenced by a consumer",
                                            operation
                                        ),
                                    )
                                    .with_rule("unused_operation")
                                    .with_location(spec_path.clone(), 1)
                                    .with_metadata("target", serde_json::json!(operation)),
                                );
                            }
                        }
                    }
                }
            }
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PlatformConfig};
    use crate::frames::test_support;
    use crate::platform::PlatformType;
    use std::sync::Arc;

    fn ctx_with_platforms(
        root: &Path,
        platforms: Vec<PlatformConfig>,
    ) -> (FrameContext, tokio::sync::watch::Sender<bool>) {
        let (ctx, tx) = test_support::context(root);
        let mut config = Config::default();
        config.platforms = platforms;
        let ctx = FrameContext {
            config: Arc::new(config),
            ..ctx
        };
        (ctx, tx)
    }

    #[tokio::test]
    async fn missing_platform_path_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _tx) = ctx_with_platforms(
            dir.path(),
            vec![PlatformConfig {
                name: "api".to_string(),
                path: "services/api".into(),
                platform_type: PlatformType::Fastapi,
                role: PlatformRole::Provider,
            }],
        );

        let findings = ContractFrame::new().execute(&[], &ctx).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id.as_deref(), Some("platform_missing"));
        assert_eq!(findings[0].target(), Some("api"));
    }

    #[tokio::test]
    async fn provider_without_spec_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("api")).unwrap();
        std::fs::write(dir.path().join("api/requirements.txt"), "fastapi\n").unwrap();
        let (ctx, _tx) = ctx_with_platforms(
            dir.path(),
            vec![PlatformConfig {
                name: "api".to_string(),
                path: "api".into(),
                platform_type: PlatformType::Fastapi,
                role: PlatformRole::Provider,
            }],
        );

        let findings = ContractFrame::new().execute(&[], &ctx).await.unwrap();
        assert!(findings
            .iter()
            .any(|f| f.rule_id.as_deref() == Some("missing_spec")));
    }

    #[tokio::test]
    async fn unreferenced_operation_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("api")).unwrap();
        std::fs::write(dir.path().join("api/requirements.txt"), "fastapi\n").unwrap();
        std::fs::write(
            dir.path().join("api/openapi.yaml"),
            "paths:\n  /users:\n    post:\n      operationId: createUser\n    get:\n      operationId: listUsers\n",
        )
        .unwrap();
        let files = vec![test_support::discovered(
            dir.path(),
            "web/client.ts",
            "client.listUsers();\n",
        )];
        let (ctx, _tx) = ctx_with_platforms(
            dir.path(),
            vec![PlatformConfig {
                name: "api".to_string(),
                path: "api".into(),
                platform_type: PlatformType::Fastapi,
                role: PlatformRole::Provider,
            }],
        );

        let findings = ContractFrame::new().execute(&files, &ctx).await.unwrap();
        let unused: Vec<_> = findings
            .iter()
            .filter(|f| f.rule_id.as_deref() == Some("unused_operation"))
            .collect();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].target(), Some("createUser"));
    }

    #[tokio::test]
    async fn no_platforms_means_no_findings() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _tx) = test_support::context(dir.path());
        let findings = ContractFrame::new().execute(&[], &ctx).await.unwrap();
        assert!(findings.is_empty());
    }
}
