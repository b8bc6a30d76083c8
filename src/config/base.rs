//! # Base Configuration Module
//!
//! Core configuration structures and loading for `.warden/config.yaml`.
//! Project config is deep-merged over user-level overrides: mappings merge
//! recursively, sequences are replaced wholesale (the list the user wrote is
//! the list that runs).

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::rules::SuppressionRule;
use crate::platform::{PlatformRole, PlatformType};

/// Relative path of the project configuration file
pub const CONFIG_PATH: &str = ".warden/config.yaml";

/// Top-level Warden configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Display name for pipeline results
    pub pipeline_name: Option<String>,
    /// Platforms participating in contract validation
    pub platforms: Vec<PlatformConfig>,
    /// Frame selection and execution settings
    pub frames: FramesConfig,
    /// Blocker thresholds evaluated after suppression
    pub thresholds: ThresholdConfig,
    /// Suppression rules applied to surviving findings
    pub suppressions: Vec<SuppressionRule>,
    /// Incremental (diff-driven) scan settings
    pub incremental: IncrementalConfig,
    /// Report and console output settings
    pub output: OutputConfig,
}

/// One platform entry for the contract/spec frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub platform_type: PlatformType,
    pub role: PlatformRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FramesConfig {
    /// Frame ids to run; empty means all registered frames
    pub enabled: Vec<String>,
    /// Worker pool size; 0 means `min(physical cores, 8)`
    pub parallelism: usize,
    /// Per-frame wall-clock timeout in seconds
    pub frame_timeout_secs: u64,
    /// Consecutive file-scan failures before a frame short-circuits
    pub max_consecutive_failures: usize,
    /// Frames to install from local sources via `warden install`
    pub install: Vec<FrameInstallSpec>,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            enabled: Vec::new(),
            parallelism: 0,
            frame_timeout_secs: 300,
            max_consecutive_failures: 5,
            install: Vec::new(),
        }
    }
}

/// Source declaration for an installable frame bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameInstallSpec {
    pub name: String,
    /// Local directory containing the frame manifest and rule files
    pub source: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub fail_on_critical: bool,
    pub fail_on_high: bool,
    pub fail_on_medium: bool,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            fail_on_critical: true,
            fail_on_high: false,
            fail_on_medium: false,
        }
    }
}

impl ThresholdConfig {
    /// Whether findings of this severity block the pipeline
    pub fn is_blocker(&self, severity: crate::types::Severity) -> bool {
        use crate::types::Severity;
        match severity {
            Severity::Critical => self.fail_on_critical,
            Severity::High => self.fail_on_high,
            Severity::Medium => self.fail_on_medium,
            Severity::Low | Severity::Info => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IncrementalConfig {
    /// Expand changed files with same-directory same-extension siblings
    pub include_siblings: bool,
    /// Extension whitelist; empty means no filtering
    pub extensions: Vec<String>,
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        Self {
            include_siblings: true,
            extensions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Findings shown per frame on the console; the JSON report always
    /// carries the full list
    pub max_display: usize,
    /// Directory for scan reports
    pub reports_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_display: 10,
            reports_dir: PathBuf::from(".warden/reports"),
        }
    }
}

impl Config {
    /// Load project configuration from `<root>/.warden/config.yaml`,
    /// deep-merged over the user-level config when one exists.
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let project_path = root.join(CONFIG_PATH);
        let user_value = user_config_path()
            .filter(|p| p.exists())
            .map(|p| read_yaml_value(&p))
            .transpose()?;

        if !project_path.exists() {
            return match user_value {
                Some(value) => parse_config(value, &project_path),
                None => Ok(Self::default()),
            };
        }

        let project_value = read_yaml_value(&project_path)?;
        let merged = match user_value {
            Some(user) => deep_merge(user, project_value),
            None => project_value,
        };
        parse_config(merged, &project_path)
    }

    /// Load configuration from an explicit file path (no user overlay)
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let value = read_yaml_value(path)?;
        parse_config(value, path)
    }

    /// Effective worker pool size
    pub fn parallelism(&self) -> usize {
        if self.frames.parallelism > 0 {
            self.frames.parallelism
        } else {
            num_cpus::get_physical().min(8).max(1)
        }
    }
}

fn read_yaml_value(path: &Path) -> anyhow::Result<serde_yaml::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse_config(value: serde_yaml::Value, path: &Path) -> anyhow::Result<Config> {
    serde_yaml::from_value(value).with_context(|| {
        format!(
            "Invalid configuration structure in {}. \
             Run 'warden scan' from a directory initialized with a valid .warden/config.yaml.",
            path.display()
        )
    })
}

/// User-level override file, `~/.config/warden/config.yaml`
fn user_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("warden")
            .join("config.yaml")
    })
}

/// Deep merge: mappings merge key-wise with `overlay` winning, everything
/// else (sequences included) is replaced by `overlay`.
pub fn deep_merge(base: serde_yaml::Value, overlay: serde_yaml::Value) -> serde_yaml::Value {
    use serde_yaml::Value;
    match (base, overlay) {
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Mapping(base_map)
        }
        (_, overlay) => overlay,
    }
}
