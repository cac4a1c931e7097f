// ABOUTME: Ant-style include patterns matched against a local directory tree.
// ABOUTME: Resolves the set of workspace files to upload, as relative '/'-separated paths.

use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Version-control and OS metadata never uploaded.
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.git/**",
    "**/.svn/**",
    "**/.hg/**",
    "**/CVS/**",
    "**/.DS_Store",
];

#[derive(Debug, Error)]
pub enum Error {
    #[error("file pattern is empty")]
    EmptyPattern,

    #[error("source directory does not exist: {0}")]
    MissingBase(PathBuf),

    #[error("invalid file pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("cannot walk source directory: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Files under a base directory matching comma-separated include patterns.
///
/// Pattern syntax: `*` matches within one path segment, `?` matches one
/// character, `**` matches any number of directories, and a trailing `/`
/// stands for `/**`.
#[derive(Debug)]
pub struct FileSet {
    base: PathBuf,
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl FileSet {
    pub fn new(base: impl Into<PathBuf>, patterns: &str) -> Result<Self> {
        let includes = patterns
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(compile_pattern)
            .collect::<Result<Vec<_>>>()?;

        if includes.is_empty() {
            return Err(Error::EmptyPattern);
        }

        let excludes = DEFAULT_EXCLUDES
            .iter()
            .map(|p| compile_pattern(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            base: base.into(),
            includes,
            excludes,
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Whether a relative `/`-separated path is selected by this set.
    pub fn matches(&self, relative: &str) -> bool {
        self.includes.iter().any(|re| re.is_match(relative))
            && !self.excludes.iter().any(|re| re.is_match(relative))
    }

    /// Walk the base directory and return matching regular files, sorted.
    ///
    /// Symlinks are followed. A link pointing back at one of its own
    /// ancestors is skipped rather than failing the walk.
    pub fn included_files(&self) -> Result<Vec<String>> {
        if !self.base.is_dir() {
            return Err(Error::MissingBase(self.base.clone()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.base).min_depth(1).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.loop_ancestor().is_some() => {
                    tracing::warn!("Skipping symlink loop: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(relative) = relative_path(&self.base, entry.path()) else {
                continue;
            };
            if self.matches(&relative) {
                files.push(relative);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// `path` relative to `base`, joined with `/`.
fn relative_path(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(segments.join("/"))
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    let mut normalized = pattern.replace('\\', "/");
    if normalized.ends_with('/') {
        normalized.push_str("**");
    }
    let normalized = normalized.trim_start_matches("./").trim_start_matches('/');

    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    let mut regex = String::from("^");
    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        if *segment == "**" {
            regex.push_str(if last { ".*" } else { "(?:[^/]*/)*" });
            continue;
        }

        for c in segment.chars() {
            match c {
                '*' => regex.push_str("[^/]*"),
                '?' => regex.push_str("[^/]"),
                other => regex.push_str(&regex::escape(&other.to_string())),
            }
        }
        if !last {
            regex.push('/');
        }
    }
    regex.push('$');

    Regex::new(&regex).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
