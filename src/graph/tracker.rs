// src/graph/tracker.rs

//! Source file <-> synthetic module maps.
//!
//! Rebuilt from scratch after every change cycle; there is no incremental
//! repair.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::generator::virtual_id;
use crate::pipeline::GroupData;
use crate::watch::path_utils::{normalize, resolve_against};

/// Where a source file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExportMap {
    pub virtual_module: String,
    pub export_key: String,
    /// Position within the group at the last rebuild.
    pub index: usize,
}

#[derive(Debug)]
pub struct DependencyTracker {
    root: PathBuf,
    chunk_size: usize,
    file_exports: HashMap<PathBuf, FileExportMap>,
    module_deps: HashMap<String, BTreeSet<PathBuf>>,
}

impl DependencyTracker {
    pub fn new(root: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            root: root.into(),
            chunk_size: chunk_size.max(1),
            file_exports: HashMap::new(),
            module_deps: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.file_exports.clear();
        self.module_deps.clear();
    }

    /// Recompute both maps from each component's processed data.
    ///
    /// Items are walked in batches of `chunk_size`; batching has no effect
    /// on the result.
    pub fn rebuild<'a, I>(&mut self, snapshots: I)
    where
        I: IntoIterator<Item = (&'a str, &'a GroupData)>,
    {
        self.clear();

        for (component, data) in snapshots {
            let mut component_deps = BTreeSet::new();

            for (export_key, value) in data {
                let Value::Array(items) = value else {
                    continue;
                };
                let module = virtual_id(export_key);
                let mut deps = BTreeSet::new();

                for (chunk_idx, chunk) in items.chunks(self.chunk_size).enumerate() {
                    for (offset, item) in chunk.iter().enumerate() {
                        let Some(source) = item_source_path(&self.root, item) else {
                            continue;
                        };
                        self.file_exports.insert(
                            source.clone(),
                            FileExportMap {
                                virtual_module: module.clone(),
                                export_key: export_key.clone(),
                                index: chunk_idx * self.chunk_size + offset,
                            },
                        );
                        deps.insert(source);
                    }
                }

                component_deps.extend(deps.iter().cloned());
                self.module_deps.insert(module, deps);
            }

            if !data.contains_key(component) {
                self.module_deps
                    .insert(virtual_id(component), component_deps);
            }
        }

        debug!(
            files = self.file_exports.len(),
            modules = self.module_deps.len(),
            "rebuilt dependency maps"
        );
    }

    pub fn export_for(&self, path: &Path) -> Option<&FileExportMap> {
        self.file_exports.get(&normalize(path))
    }

    /// Absolute source files behind a synthetic module.
    pub fn deps_of(&self, module: &str) -> Option<&BTreeSet<PathBuf>> {
        self.module_deps.get(module)
    }

    /// Synthetic modules that depend on `path`.
    pub fn modules_for_file(&self, path: &Path) -> Vec<String> {
        let path = normalize(path);
        let mut modules: Vec<String> = self
            .module_deps
            .iter()
            .filter(|(_, deps)| deps.contains(&path))
            .map(|(m, _)| m.clone())
            .collect();
        modules.sort();
        modules
    }

    pub fn tracked_files(&self) -> usize {
        self.file_exports.len()
    }
}

/// Absolute source path behind an item: its `file`, or its `path` resolved
/// against the project root.
fn item_source_path(root: &Path, item: &Value) -> Option<PathBuf> {
    if let Some(file) = item.get("file").and_then(Value::as_str) {
        return Some(resolve_against(root, Path::new(file)));
    }
    let path = item.get("path").and_then(Value::as_str)?;
    Some(normalize(&root.join(path.trim_start_matches('/'))))
}
