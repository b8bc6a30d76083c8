//! Common path utilities for consistent path handling across commands and
//! the finding pipeline.

use std::path::{Component, Path, PathBuf};

/// Normalize a path to project-relative POSIX form.
///
/// Absolute paths are made relative to `root` when they live under it.
/// Separators are normalized to `/`; `.` components are dropped.
pub fn to_project_relative(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut parts: Vec<String> = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(p) => parts.push(p.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => parts.push("..".to_string()),
            Component::RootDir | Component::Prefix(_) => {}
        }
    }
    parts.join("/")
}

/// Canonicalize when possible, fall back to the input path otherwise
/// (missing files, permission issues).
pub fn canonicalize_safe(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Ensure the parent directory of an output path exists
pub async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_become_posix() {
        let root = Path::new("/project");
        let path = Path::new("/project/src/app.py");
        assert_eq!(to_project_relative(path, root), "src/app.py");
    }

    #[test]
    fn paths_outside_root_pass_through() {
        let root = Path::new("/project");
        let path = Path::new("other/file.py");
        assert_eq!(to_project_relative(path, root), "other/file.py");
    }

    #[test]
    fn current_dir_components_dropped() {
        let root = Path::new("/project");
        let path = Path::new("./src/./app.py");
        assert_eq!(to_project_relative(path, root), "src/app.py");
    }
}
