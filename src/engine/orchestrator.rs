// src/engine/orchestrator.rs

//! The change orchestrator.
//!
//! Owns every piece of cross-cycle state: the generators, the name index,
//! the change cache, the dependency tracker and the importer graph. A cycle
//! takes `&mut self`, so two cycles can never interleave.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use tracing::{debug, error, info, warn};

use crate::artifacts::types::{TypeDeclaration, collect_type_values, render_type_declarations};
use crate::artifacts::write_if_changed;
use crate::config::{ConfigFile, Settings};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::generator::{CollectionGenerator, NameIndex, virtual_id};
use crate::graph::{DependencyTracker, ImporterGraph};
use crate::host::{HotUpdate, ReloadSink, host_module_id};
use crate::pipeline::GroupData;
use crate::types::BuildContext;
use crate::watch::hash::ChangeCache;

/// What one change cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Synthetic modules whose content hash changed.
    pub changed: BTreeSet<String>,
    /// Changed modules plus every importer reached from them.
    pub invalidated: BTreeSet<String>,
    /// Whether the type declarations file was rewritten.
    pub types_written: bool,
    /// Components whose data could not be recomputed this cycle.
    pub failed: Vec<String>,
}

pub struct Orchestrator {
    settings: Settings,
    fs: Arc<dyn FileSystem>,
    name_index: NameIndex,
    generators: Vec<CollectionGenerator>,
    cache: ChangeCache,
    tracker: DependencyTracker,
    importers: ImporterGraph,
    sink: Arc<dyn ReloadSink>,
    last_good: HashMap<String, GroupData>,
    // Set when writing type declarations failed; retried on the next cycle.
    types_pending: bool,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("generators", &self.generators.len())
            .field("names", &self.name_index.len())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Validate the namespace and build every generator.
    ///
    /// Duplicate names, bad patterns, missing directories and failing
    /// producers are fatal here.
    pub async fn new(
        config: ConfigFile,
        fs: Arc<dyn FileSystem>,
        sink: Arc<dyn ReloadSink>,
    ) -> Result<Self> {
        let name_index = NameIndex::new(&config.components)?;
        let settings = config.settings;
        let root = settings.root_dir.clone();
        let policy = settings.build.transform_errors;

        let generators = try_join_all(config.components.into_iter().map(|component| {
            CollectionGenerator::initialize(component, Arc::clone(&fs), &root, policy)
        }))
        .await?;

        let tracker = DependencyTracker::new(&root, settings.chunk_size);

        Ok(Self {
            settings,
            fs,
            name_index,
            generators,
            cache: ChangeCache::default(),
            tracker,
            importers: ImporterGraph::new(),
            sink,
            last_good: HashMap::new(),
            types_pending: false,
        })
    }

    /// Record baseline hashes, build the dependency maps and write types.
    pub async fn init(&mut self) -> Result<()> {
        let ctx = BuildContext::dev();
        let ctx = &ctx;
        let snapshots = try_join_all(self.generators.iter_mut().map(|g| async move {
            let data = g.data(ctx).await?;
            Ok::<_, crate::errors::AutoloadError>((g.name().to_string(), data))
        }))
        .await?;

        for (component, data) in snapshots {
            for (name, subset) in subsets(&self.name_index, &component, &data) {
                self.cache.record(&virtual_id(name), &subset);
            }
            self.last_good.insert(component, data);
        }

        self.rebuild_tracker();
        self.refresh_types();
        info!(
            generators = self.generators.len(),
            tracked_files = self.tracker.tracked_files(),
            "orchestrator initialized"
        );
        Ok(())
    }

    /// Drop all cross-cycle state.
    pub fn dispose(&mut self) {
        self.tracker.clear();
        self.importers.clear();
        self.cache.clear();
        self.last_good.clear();
        debug!("orchestrator disposed");
    }

    /// One change cycle over a settled burst of paths.
    ///
    /// Errors are logged and reported; the previous data of a failing
    /// component keeps being served.
    pub async fn handle_changes(&mut self, paths: &[PathBuf]) -> CycleReport {
        let mut report = CycleReport::default();

        for path in paths {
            self.apply_path(path);
        }

        let ctx = BuildContext::dev();
        let ctx = &ctx;
        let results = join_all(self.generators.iter_mut().map(|g| async move {
            let result = g.data(ctx).await;
            (g.name().to_string(), result)
        }))
        .await;

        for (component, result) in results {
            let data = match result {
                Ok(data) => data,
                Err(e) => {
                    error!(
                        component = %component,
                        error = %e,
                        "failed to regenerate data; keeping last good content"
                    );
                    report.failed.push(component);
                    continue;
                }
            };
            for (name, subset) in subsets(&self.name_index, &component, &data) {
                let module = virtual_id(name);
                if self.cache.has_changed(&module, &subset) {
                    report.changed.insert(module);
                }
            }
            self.last_good.insert(component, data);
        }

        self.rebuild_tracker();

        if report.changed.is_empty() {
            debug!(paths = paths.len(), "no generated content changed");
            if self.types_pending {
                report.types_written = self.refresh_types();
            }
            return report;
        }

        report.invalidated = report.changed.clone();
        report
            .invalidated
            .extend(self.importers.affected_importers(&report.changed));

        let modules: Vec<String> = report
            .invalidated
            .iter()
            .map(String::as_str)
            .map(host_module_id)
            .collect();
        self.sink.invalidate(&modules);
        self.sink.notify(&HotUpdate {
            modules,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        });

        report.types_written = self.refresh_types();

        info!(
            changed = ?report.changed,
            invalidated = report.invalidated.len(),
            "change cycle complete"
        );
        report
    }

    /// Patch generator state for one path: re-resolve, add or remove.
    ///
    /// A directory that appears is scanned for new files; one that vanishes
    /// takes every tracked file beneath it along.
    fn apply_path(&mut self, path: &Path) {
        let is_file = self.fs.is_file(path);
        let is_dir = !is_file && self.fs.is_dir(path);
        for generator in &mut self.generators {
            let touched = if is_dir {
                generator.add_tree(path)
            } else if !is_file {
                let removed = generator.remove_file(path);
                generator.remove_under(path) || removed
            } else if generator.has_file(path) {
                generator.touch_file(path)
            } else {
                generator.add_file(path)
            };
            if touched {
                debug!(component = %generator.name(), ?path, is_file, is_dir, "applied change");
            }
        }
    }

    fn rebuild_tracker(&mut self) {
        let snapshots = self.generators.iter().filter_map(|g| {
            self.last_good
                .get_key_value(g.name())
                .map(|(name, data)| (name.as_str(), data))
        });
        self.tracker.rebuild(snapshots);
    }

    /// Write types from the last good data; a failure is logged and left
    /// pending for the next cycle.
    fn refresh_types(&mut self) -> bool {
        match self.write_types(&self.last_good) {
            Ok(written) => {
                self.types_pending = false;
                written
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "failed to write type declarations");
                self.types_pending = true;
                false
            }
        }
    }

    /// Render and write type declarations from per-component data.
    pub fn write_types(&self, data: &HashMap<String, GroupData>) -> anyhow::Result<bool> {
        let Some(path) = self.settings.types_path() else {
            return Ok(false);
        };
        let decls: Vec<TypeDeclaration> = self
            .generators
            .iter()
            .filter_map(|g| {
                let strategy = g.config().strategy.types.as_ref()?;
                let component_data = data.get(g.name())?;
                Some(collect_type_values(g.name(), strategy, component_data))
            })
            .collect();
        if decls.is_empty() {
            return Ok(false);
        }
        write_if_changed(self.fs.as_ref(), &path, &render_type_declarations(&decls))
    }

    /// Data of every generator for `ctx`, keyed by component name.
    pub async fn snapshot(&mut self, ctx: &BuildContext) -> Result<HashMap<String, GroupData>> {
        let pairs = try_join_all(self.generators.iter_mut().map(|g| async move {
            let data = g.data(ctx).await?;
            Ok::<_, crate::errors::AutoloadError>((g.name().to_string(), data))
        }))
        .await?;
        Ok(pairs.into_iter().collect())
    }

    pub fn name_index(&self) -> &NameIndex {
        &self.name_index
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn generators(&self) -> &[CollectionGenerator] {
        &self.generators
    }

    /// The generator that owns `name` (a component or group name).
    pub fn generator_for(&mut self, name: &str) -> Option<&mut CollectionGenerator> {
        let component = self.name_index.lookup(name)?.component.clone();
        self.generators.iter_mut().find(|g| g.name() == component)
    }

    pub fn tracker(&self) -> &DependencyTracker {
        &self.tracker
    }

    pub fn importers(&self) -> &ImporterGraph {
        &self.importers
    }

    pub fn importers_mut(&mut self) -> &mut ImporterGraph {
        &mut self.importers
    }

    pub fn sink(&self) -> &Arc<dyn ReloadSink> {
        &self.sink
    }

    /// Directories the watcher should observe.
    pub fn watch_directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .generators
            .iter()
            .flat_map(|g| g.directories())
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }
}

/// `(name, data)` for the component itself and for each of its groups.
fn subsets<'a>(
    index: &'a NameIndex,
    component: &str,
    data: &GroupData,
) -> Vec<(&'a str, GroupData)> {
    index
        .names_for_component(component)
        .into_iter()
        .map(|name| {
            let subset = if name == component {
                data.clone()
            } else {
                data.get(name)
                    .map(|v| {
                        let mut m = GroupData::new();
                        m.insert(name.to_string(), v.clone());
                        m
                    })
                    .unwrap_or_default()
            };
            (name, subset)
        })
        .collect()
}
