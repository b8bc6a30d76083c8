//! Ignore pattern handling for `.gitignore` and `.wardenignore`.
//!
//! Supports the common subset: blank lines and `#` comments are skipped,
//! a trailing `/` restricts a pattern to directories, a leading `!` negates,
//! and the last matching pattern wins. Patterns without a `/` match the
//! basename anywhere in the tree.

use std::path::Path;
use tracing::debug;

use crate::utils::glob::path_match;

#[derive(Debug, Clone)]
struct IgnorePattern {
    glob: String,
    negated: bool,
    dir_only: bool,
    anchored: bool,
}

/// Compiled ignore rules for one project root
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreMatcher {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read `.gitignore` and `.wardenignore` at the root, in that order, so
    /// warden-specific rules override git ones.
    pub fn load(root: &Path) -> Self {
        let mut matcher = Self::default();
        for name in [".gitignore", ".wardenignore"] {
            let path = root.join(name);
            if let Ok(content) = std::fs::read_to_string(&path) {
                debug!("loaded ignore file {}", path.display());
                matcher.add_lines(&content);
            }
        }
        matcher
    }

    pub fn add_lines(&mut self, content: &str) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (negated, rest) = match line.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            let (dir_only, rest) = match rest.strip_suffix('/') {
                Some(rest) => (true, rest),
                None => (false, rest),
            };
            let anchored = rest.contains('/');
            let glob = rest.trim_start_matches('/').to_string();
            if glob.is_empty() {
                continue;
            }
            self.patterns.push(IgnorePattern {
                glob,
                negated,
                dir_only,
                anchored,
            });
        }
    }

    /// Whether a project-relative POSIX path is ignored. Last match wins.
    pub fn is_ignored(&self, rel_path: &str, is_dir: bool) -> bool {
        if rel_path.is_empty() {
            return false;
        }
        let mut ignored = false;
        for pattern in &self.patterns {
            if pattern.dir_only && !is_dir {
                // a dir-only pattern still covers files beneath that dir
                if !self.under_dir(&pattern.glob, rel_path) {
                    continue;
                }
            } else if !self.matches(pattern, rel_path) {
                continue;
            }
            ignored = !pattern.negated;
        }
        ignored
    }

    fn matches(&self, pattern: &IgnorePattern, rel_path: &str) -> bool {
        if pattern.anchored {
            path_match(&pattern.glob, rel_path)
        } else {
            // unanchored: match the basename or any suffix component
            rel_path
                .rsplit('/')
                .next()
                .map(|base| path_match(&pattern.glob, base))
                .unwrap_or(false)
                || path_match(&format!("**/{}", pattern.glob), rel_path)
        }
    }

    fn under_dir(&self, dir_glob: &str, rel_path: &str) -> bool {
        rel_path
            .split('/')
            .scan(String::new(), |acc, part| {
                if !acc.is_empty() {
                    acc.push('/');
                }
                acc.push_str(part);
                Some(acc.clone())
            })
            .any(|prefix| path_match(dir_glob, &prefix) || path_match(&format!("**/{}", dir_glob), &prefix))
    }
}
