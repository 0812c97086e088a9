// src/resolve/files.rs

//! File-backed groups: the live set of resolved files per group.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::config::GroupConfig;
use crate::errors::{AutoloadError, Result};
use crate::fs::FileSystem;
use crate::resolve::patterns::MatchRule;
use crate::watch::path_utils::{is_ignored_path, normalize, relative_str, to_slash};

/// A file selected by a group's match rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Path relative to the group directory, forward slashes.
    pub path: String,
    /// Configured directory joined with `path`.
    pub uri: String,
    /// Absolute path on disk.
    pub file: PathBuf,
}

impl ResolvedFile {
    fn new(directory_label: &str, rel: String, file: PathBuf) -> Self {
        let uri = join_uri(directory_label, &rel);
        Self {
            path: rel,
            uri,
            file,
        }
    }

    /// Item shape handed to the processor.
    pub fn to_value(&self, data: Option<&Map<String, Value>>) -> Value {
        let mut item = json!({
            "path": self.path,
            "uri": self.uri,
            "file": to_slash(&self.file),
        });
        if let (Some(data), Value::Object(obj)) = (data, &mut item) {
            obj.insert("data".to_string(), Value::Object(data.clone()));
        }
        item
    }
}

fn join_uri(directory: &str, rel: &str) -> String {
    let dir = directory.trim_start_matches("./").trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        rel.to_string()
    } else {
        format!("{dir}/{rel}")
    }
}

/// Insertion-ordered map from absolute path to resolved file.
///
/// Replacing an existing path keeps its original position.
#[derive(Debug, Default)]
struct GroupFiles {
    next_seq: u64,
    order: BTreeMap<u64, PathBuf>,
    entries: HashMap<PathBuf, (u64, ResolvedFile)>,
}

impl GroupFiles {
    fn insert(&mut self, key: PathBuf, file: ResolvedFile) {
        if let Some((_, existing)) = self.entries.get_mut(&key) {
            *existing = file;
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        self.entries.insert(key, (seq, file));
    }

    fn remove(&mut self, key: &Path) -> Option<ResolvedFile> {
        let (seq, file) = self.entries.remove(key)?;
        self.order.remove(&seq);
        Some(file)
    }

    fn contains(&self, key: &Path) -> bool {
        self.entries.contains_key(key)
    }

    fn iter(&self) -> impl Iterator<Item = &ResolvedFile> {
        self.order
            .values()
            .filter_map(|key| self.entries.get(key).map(|(_, f)| f))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn keys_under(&self, dir: &Path) -> Vec<PathBuf> {
        self.entries
            .keys()
            .filter(|key| key.starts_with(dir) && key.as_path() != dir)
            .cloned()
            .collect()
    }

    fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}

#[derive(Debug)]
struct FileGroup {
    name: String,
    directory_label: String,
    rule: MatchRule,
    files: GroupFiles,
    version: u64,
}

impl FileGroup {
    fn key_for(&self, path: &Path) -> Option<(String, PathBuf)> {
        let rel = relative_str(self.rule.directory(), path)?;
        let key = normalize(&self.rule.directory().join(&rel));
        Some((rel, key))
    }
}

/// One group's files, in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntries {
    pub name: String,
    pub files: Vec<ResolvedFile>,
}

/// Resolves every file-backed group of a component.
#[derive(Debug)]
pub struct FileResolver {
    fs: Arc<dyn FileSystem>,
    groups: Vec<FileGroup>,
}

impl FileResolver {
    /// Compile match rules for the file-backed groups in `groups`.
    ///
    /// No scan happens until [`FileResolver::initialize`].
    pub fn new(fs: Arc<dyn FileSystem>, root: &Path, groups: &[GroupConfig]) -> Result<Self> {
        let mut compiled = Vec::new();
        for group in groups {
            let Some(cfg) = group.file_match() else {
                continue;
            };
            let rule = MatchRule::compile(root, cfg).map_err(|e| {
                AutoloadError::ConfigError(format!("group '{}': {e:#}", group.name))
            })?;
            compiled.push(FileGroup {
                name: group.name.clone(),
                directory_label: cfg.directory.clone(),
                rule,
                files: GroupFiles::default(),
                version: 0,
            });
        }
        Ok(Self {
            fs,
            groups: compiled,
        })
    }

    /// Rescan every group from disk.
    pub fn initialize(&mut self) -> Result<()> {
        for group in &mut self.groups {
            group.files.clear();
            let found = group.rule.scan(self.fs.as_ref()).map_err(|e| {
                AutoloadError::ResolutionError {
                    group: group.name.clone(),
                    message: format!("{e:#}"),
                }
            })?;
            for (rel, abs) in found {
                let key = normalize(&abs);
                let file = ResolvedFile::new(&group.directory_label, rel, key.clone());
                group.files.insert(key, file);
            }
            group.version += 1;
            info!(group = %group.name, files = group.files.len(), "resolved file group");
        }
        Ok(())
    }

    /// Insert `path` into every group whose rule selects it. Returns the
    /// names of those groups.
    pub fn add_file(&mut self, path: &Path) -> Vec<String> {
        let mut accepted = Vec::new();
        for group in &mut self.groups {
            let Some(rel) = group.rule.select(path) else {
                continue;
            };
            let key = normalize(&group.rule.directory().join(&rel));
            let file = ResolvedFile::new(&group.directory_label, rel, key.clone());
            group.files.insert(key, file);
            group.version += 1;
            debug!(group = %group.name, ?path, "added file");
            accepted.push(group.name.clone());
        }
        accepted
    }

    /// Remove `path` from every group that holds it. Returns the names of
    /// those groups.
    pub fn remove_file(&mut self, path: &Path) -> Vec<String> {
        let mut affected = Vec::new();
        for group in &mut self.groups {
            let Some((_, key)) = group.key_for(path) else {
                continue;
            };
            if group.files.remove(&key).is_some() {
                group.version += 1;
                debug!(group = %group.name, ?path, "removed file");
                affected.push(group.name.clone());
            }
        }
        affected
    }

    /// Walk a directory that appeared and add every file under it that is not
    /// tracked yet. Returns the names of the groups that took a file.
    pub fn add_tree(&mut self, dir: &Path) -> Vec<String> {
        let mut accepted: Vec<String> = Vec::new();
        let mut stack = vec![dir.to_path_buf()];

        while let Some(current) = stack.pop() {
            let entries = match self.fs.read_dir(&current) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(dir = ?current, error = %format!("{e:#}"), "skipping unreadable directory");
                    continue;
                }
            };
            for entry in entries {
                if entry
                    .file_name()
                    .is_some_and(|name| is_ignored_path(Path::new(name)))
                {
                    continue;
                }
                if self.fs.is_dir(&entry) {
                    stack.push(entry);
                } else if !self.has_file(&entry) {
                    for name in self.add_file(&entry) {
                        if !accepted.contains(&name) {
                            accepted.push(name);
                        }
                    }
                }
            }
        }
        accepted
    }

    /// Drop every tracked file below a directory that went away. Returns the
    /// names of the groups that lost files.
    pub fn remove_under(&mut self, dir: &Path) -> Vec<String> {
        let dir = normalize(dir);
        let mut affected = Vec::new();
        for group in &mut self.groups {
            let gone = group.files.keys_under(&dir);
            if gone.is_empty() {
                continue;
            }
            for key in &gone {
                group.files.remove(key);
            }
            group.version += 1;
            debug!(group = %group.name, ?dir, removed = gone.len(), "removed directory");
            affected.push(group.name.clone());
        }
        affected
    }

    /// Re-resolve a file that is already tracked (its content changed).
    pub fn touch_file(&mut self, path: &Path) -> Vec<String> {
        let mut affected = Vec::new();
        for group in &mut self.groups {
            let Some((rel, key)) = group.key_for(path) else {
                continue;
            };
            if !group.files.contains(&key) {
                continue;
            }
            let file = ResolvedFile::new(&group.directory_label, rel, key.clone());
            group.files.insert(key, file);
            group.version += 1;
            affected.push(group.name.clone());
        }
        affected
    }

    pub fn has_file(&self, path: &Path) -> bool {
        self.groups.iter().any(|g| {
            g.key_for(path)
                .is_some_and(|(_, key)| g.files.contains(&key))
        })
    }

    /// Whether any group's rule would select `path`.
    pub fn accepts(&self, path: &Path) -> bool {
        self.groups.iter().any(|g| g.rule.select(path).is_some())
    }

    /// One entry per file-backed group, in declaration order.
    pub fn entries(&self) -> Vec<GroupEntries> {
        self.groups
            .iter()
            .map(|g| GroupEntries {
                name: g.name.clone(),
                files: g.files.iter().cloned().collect(),
            })
            .collect()
    }

    pub fn group_files(&self, name: &str) -> Option<Vec<ResolvedFile>> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.files.iter().cloned().collect())
    }

    pub fn versions(&self) -> BTreeMap<String, u64> {
        self.groups
            .iter()
            .map(|g| (g.name.clone(), g.version))
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }

    /// Directories watched for this resolver.
    pub fn directories(&self) -> Vec<PathBuf> {
        self.groups
            .iter()
            .map(|g| g.rule.directory().to_path_buf())
            .collect()
    }
}
