//! Project file enumeration.
//!
//! Walks the project tree while respecting .gitignore rules, a default
//! exclusion list for build artifacts and VCS directories, and a size cap.
//! Every eligible file is returned as a (relative, absolute) path pair; the
//! relative form is slash-normalized and serves as the index key.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

pub struct FileDiscovery {
    /// Additional include patterns that override excludes
    include_patterns: Vec<String>,
    /// Additional ignore patterns
    exclude_patterns: Vec<String>,
    /// Whether to apply default excludes
    default_excludes: bool,
    /// Whether to include hidden files
    include_hidden: bool,
    /// Max file size (bytes)
    max_file_size: u64,
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            default_excludes: true,
            include_hidden: false,
            max_file_size: 2 * 1024 * 1024,
        }
    }
}

impl FileDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include(mut self, pattern: &str) -> Self {
        self.include_patterns.push(pattern.to_string());
        self
    }

    pub fn with_exclude(mut self, pattern: &str) -> Self {
        self.exclude_patterns.push(pattern.to_string());
        self
    }

    pub fn without_default_excludes(mut self) -> Self {
        self.default_excludes = false;
        self
    }

    pub fn include_hidden(mut self) -> Self {
        self.include_hidden = true;
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Enumerate all eligible files under `root`.
    ///
    /// Returns (project-relative slash-normalized path, absolute path)
    /// pairs, sorted by relative path for deterministic downstream order.
    pub fn discover(&self, root: &Path) -> Result<Vec<(String, PathBuf)>> {
        let default_excludes = if self.default_excludes {
            build_globset(default_exclude_patterns())?
        } else {
            GlobSetBuilder::new().build()?
        };

        let user_excludes = build_globset(self.exclude_patterns.iter().map(|s| s.as_str()))?;
        let user_includes = build_globset(self.include_patterns.iter().map(|s| s.as_str()))?;

        let walker = WalkBuilder::new(root)
            .hidden(!self.include_hidden)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false) // Parse .gitignore even without .git directory
            .build();

        let mut files = Vec::<(String, PathBuf)>::new();

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }

            let rel = path.strip_prefix(root).unwrap_or(path);
            if is_excluded(rel, &default_excludes, &user_excludes, &user_includes) {
                continue;
            }
            if !self.within_size_limit(path) {
                continue;
            }

            files.push((normalize_relative(rel), path.to_path_buf()));
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    fn within_size_limit(&self, path: &Path) -> bool {
        let Ok(metadata) = fs::metadata(path) else {
            return false;
        };
        metadata.len() <= self.max_file_size
    }
}

/// Convert a relative path to the slash-normalized string form used as the
/// index key.
pub fn normalize_relative(rel: &Path) -> String {
    let s = rel.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

pub(crate) fn default_exclude_patterns() -> Vec<&'static str> {
    vec![
        "**/.git/**",
        "**/.scout/**",
        "**/target/**",
        "**/node_modules/**",
        "**/dist/**",
        "**/build/**",
        "**/out/**",
        "**/coverage/**",
        "**/vendor/**",
        "**/.venv/**",
        "**/__pycache__/**",
        "**/.next/**",
        "**/package-lock.json",
        "**/yarn.lock",
        "**/pnpm-lock.yaml",
        "**/Cargo.lock",
        "**/*.min.js",
        "**/*.min.css",
        "**/*.map",
        "**/*.png",
        "**/*.jpg",
        "**/*.jpeg",
        "**/*.gif",
        "**/*.webp",
        "**/*.pdf",
        "**/*.zip",
        "**/*.gz",
        "**/*.tar",
        "**/*.tgz",
        "**/*.jar",
        "**/*.wasm",
        "**/*.pyc",
        "**/*.o",
        "**/*.a",
        "**/*.so",
        "**/*.dylib",
        "**/*.dll",
    ]
}

fn build_globset<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn is_excluded(path: &Path, default: &GlobSet, user: &GlobSet, include: &GlobSet) -> bool {
    let is_included = include.is_match(path);
    let is_excluded = default.is_match(path) || user.is_match(path);
    is_excluded && !is_included
}
