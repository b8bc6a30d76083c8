//! # Discovery Module
//!
//! Walks the project tree, classifies files by type, honors ignore patterns
//! and detects frameworks from manifest files. Discovery never fails the
//! pipeline: unreadable directories are logged and skipped.

pub mod frameworks;
pub mod ignore;

pub use frameworks::{detect_frameworks, FrameworkDetectionResult};
pub use ignore::IgnoreMatcher;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::utils::paths::to_project_relative;

/// Files above this size are listed but excluded from content scanning
pub const MAX_ANALYZABLE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Directory names never descended into, regardless of ignore files
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    ".gradle",
    ".idea",
    ".vscode",
    "vendor",
    "coverage",
    ".next",
    ".nuxt",
    ".cache",
];

/// Classification of a discovered file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    Kotlin,
    Swift,
    Ruby,
    Php,
    CSharp,
    C,
    Cpp,
    Shell,
    Sql,
    Html,
    Css,
    Yaml,
    Json,
    Toml,
    Xml,
    Markdown,
    Dockerfile,
    Binary,
    Other,
}

impl FileType {
    /// Classify by file name and extension
    pub fn classify(path: &Path) -> Self {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name == "Dockerfile" || name.starts_with("Dockerfile.") {
                return FileType::Dockerfile;
            }
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "rs" => FileType::Rust,
            "py" | "pyi" => FileType::Python,
            "js" | "jsx" | "mjs" | "cjs" => FileType::JavaScript,
            "ts" | "tsx" | "mts" => FileType::TypeScript,
            "go" => FileType::Go,
            "java" => FileType::Java,
            "kt" | "kts" => FileType::Kotlin,
            "swift" => FileType::Swift,
            "rb" => FileType::Ruby,
            "php" => FileType::Php,
            "cs" => FileType::CSharp,
            "c" | "h" => FileType::C,
            "cpp" | "cc" | "cxx" | "hpp" => FileType::Cpp,
            "sh" | "bash" | "zsh" => FileType::Shell,
            "sql" => FileType::Sql,
            "html" | "htm" => FileType::Html,
            "css" | "scss" | "less" => FileType::Css,
            "yaml" | "yml" => FileType::Yaml,
            "json" => FileType::Json,
            "toml" => FileType::Toml,
            "xml" => FileType::Xml,
            "md" | "markdown" => FileType::Markdown,
            "exe" | "dll" | "so" | "dylib" | "a" | "o" | "bin" | "png" | "jpg" | "jpeg" | "gif"
            | "ico" | "pdf" | "zip" | "tar" | "gz" | "woff" | "woff2" | "ttf" => FileType::Binary,
            _ => FileType::Other,
        }
    }

    /// Whether content scanning applies to this file type
    pub fn is_analyzable(&self) -> bool {
        !matches!(self, FileType::Binary | FileType::Other)
    }

    /// Language name for source types
    pub fn language(&self) -> Option<&'static str> {
        match self {
            FileType::Rust => Some("rust"),
            FileType::Python => Some("python"),
            FileType::JavaScript => Some("javascript"),
            FileType::TypeScript => Some("typescript"),
            FileType::Go => Some("go"),
            FileType::Java => Some("java"),
            FileType::Kotlin => Some("kotlin"),
            FileType::Swift => Some("swift"),
            FileType::Ruby => Some("ruby"),
            FileType::Php => Some("php"),
            FileType::CSharp => Some("csharp"),
            FileType::C => Some("c"),
            FileType::Cpp => Some("cpp"),
            FileType::Shell => Some("shell"),
            FileType::Sql => Some("sql"),
            _ => None,
        }
    }
}

/// One file found by the walker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub file_type: FileType,
    pub is_analyzable: bool,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Options controlling the walk
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub max_depth: Option<usize>,
    pub honor_ignores: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            honor_ignores: true,
        }
    }
}

/// Result of a discovery walk
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    pub files: Vec<DiscoveredFile>,
    pub frameworks: FrameworkDetectionResult,
    pub skipped_dirs: usize,
}

impl DiscoveryResult {
    pub fn analyzable(&self) -> impl Iterator<Item = &DiscoveredFile> {
        self.files.iter().filter(|f| f.is_analyzable)
    }
}

/// Walk `root` depth-first and produce the ordered file list.
pub fn discover(root: &Path, options: &DiscoveryOptions) -> DiscoveryResult {
    let ignores = if options.honor_ignores {
        IgnoreMatcher::load(root)
    } else {
        IgnoreMatcher::empty()
    };

    let mut files = Vec::new();
    let mut skipped_dirs = 0usize;

    let mut walker = WalkDir::new(root).follow_links(false);
    if let Some(depth) = options.max_depth {
        walker = walker.max_depth(depth);
    }

    let iter = walker.into_iter().filter_entry(|entry| {
        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy();
            if EXCLUDED_DIRS.iter().any(|d| *d == name) {
                return false;
            }
        }
        let rel = to_project_relative(entry.path(), root);
        !(ignores.is_ignored(&rel, entry.file_type().is_dir()))
    });

    for entry in iter {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable path: {}", e);
                skipped_dirs += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path().to_path_buf();
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        let file_type = FileType::classify(&path);
        let is_analyzable = file_type.is_analyzable() && size_bytes <= MAX_ANALYZABLE_SIZE_BYTES;
        files.push(DiscoveredFile {
            language: file_type.language().map(String::from),
            path,
            file_type,
            is_analyzable,
            size_bytes,
        });
    }

    // Deterministic ordering regardless of filesystem iteration order
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let frameworks = detect_frameworks(root, &files);
    debug!(
        files = files.len(),
        skipped = skipped_dirs,
        "discovery complete"
    );

    DiscoveryResult {
        files,
        frameworks,
        skipped_dirs,
    }
}
