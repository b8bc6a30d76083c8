//! # Platform Detection & Setup
//!
//! Confidence-scored project-type detection used by the contract frame and
//! by initial project configuration.

pub mod detector;
pub mod setup;
pub mod signatures;

pub use detector::{detect_projects, DetectorOptions};
pub use setup::{persist_platforms, validate_projects};
pub use signatures::{builtin_signatures, PlatformSignature};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Closed set of supported platform types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlatformType {
    Nodejs,
    React,
    Nextjs,
    Vue,
    Nuxt,
    Angular,
    Python,
    Django,
    Flask,
    Fastapi,
    Rust,
    Go,
    JavaSpring,
    Ios,
    Android,
    Flutter,
}

impl PlatformType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformType::Nodejs => "nodejs",
            PlatformType::React => "react",
            PlatformType::Nextjs => "nextjs",
            PlatformType::Vue => "vue",
            PlatformType::Nuxt => "nuxt",
            PlatformType::Angular => "angular",
            PlatformType::Python => "python",
            PlatformType::Django => "django",
            PlatformType::Flask => "flask",
            PlatformType::Fastapi => "fastapi",
            PlatformType::Rust => "rust",
            PlatformType::Go => "go",
            PlatformType::JavaSpring => "java_spring",
            PlatformType::Ios => "ios",
            PlatformType::Android => "android",
            PlatformType::Flutter => "flutter",
        }
    }
}

/// Whether a platform consumes or provides APIs in contract validation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlatformRole {
    Consumer,
    Provider,
    Both,
}

/// A project detected under the search root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedProject {
    pub name: String,
    pub path: PathBuf,
    pub platform_type: PlatformType,
    pub role: PlatformRole,
    pub confidence: f64,
    pub evidence: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}
