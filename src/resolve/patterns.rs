// src/resolve/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::config::FileMatchConfig;
use crate::fs::FileSystem;
use crate::watch::path_utils::{is_ignored_path, relative_str, resolve_against};

/// Compiled include/exclude globs for one file-backed group.
///
/// Patterns are evaluated against paths relative to `directory`, with `*`
/// never crossing a `/` (use `**` for that).
#[derive(Clone)]
pub struct MatchRule {
    directory: PathBuf,
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchRule")
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

impl MatchRule {
    /// Compile a rule whose `directory` is resolved against `root`.
    pub fn compile(root: &Path, cfg: &FileMatchConfig) -> Result<Self> {
        let directory = resolve_against(root, Path::new(&cfg.directory));
        let include = build_globset(&cfg.patterns)
            .with_context(|| format!("compiling match patterns for {:?}", cfg.directory))?;
        let exclude = if cfg.ignore.is_empty() {
            None
        } else {
            Some(
                build_globset(&cfg.ignore)
                    .with_context(|| format!("compiling ignore patterns for {:?}", cfg.directory))?,
            )
        };
        Ok(Self {
            directory,
            include,
            exclude,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Whether a path relative to the rule's directory is selected.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Relative path of `abs` if it lives under this rule's directory and is
    /// selected by the globs.
    pub fn select(&self, abs: &Path) -> Option<String> {
        let rel = relative_str(&self.directory, abs)?;
        if rel.is_empty() || rel.starts_with("../") || is_ignored_path(Path::new(&rel)) {
            return None;
        }
        self.matches(&rel).then_some(rel)
    }

    /// Walk the directory and return every selected file as
    /// `(relative_path, absolute_path)` in discovery order.
    ///
    /// A missing directory is an error.
    pub fn scan(&self, fs: &dyn FileSystem) -> Result<Vec<(String, PathBuf)>> {
        if !fs.is_dir(&self.directory) {
            anyhow::bail!("directory {:?} does not exist", self.directory);
        }

        let mut found = Vec::new();
        let mut stack = vec![self.directory.clone()];

        while let Some(dir) = stack.pop() {
            let entries = fs.read_dir(&dir)?;
            // Push subdirectories in reverse so they pop in name order.
            let mut subdirs = Vec::new();
            for entry in entries {
                let Some(rel) = relative_str(&self.directory, &entry) else {
                    continue;
                };
                if is_ignored_path(Path::new(&rel)) {
                    continue;
                }
                if fs.is_dir(&entry) {
                    subdirs.push(entry);
                } else if self.matches(&rel) {
                    found.push((rel, entry));
                }
            }
            stack.extend(subdirs.into_iter().rev());
        }

        debug!(directory = ?self.directory, count = found.len(), "scanned match rule");
        Ok(found)
    }
}

/// Build a `GlobSet` from a list of pattern strings.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    let set = builder.build().context("building globset")?;
    Ok(set)
}
