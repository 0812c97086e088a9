// src/host/plugin.rs

//! Host-facing hooks.
//!
//! [`AutoloadPlugin`] is a cheap handle around the shared orchestrator. Each
//! hook locks it for the duration of the call, which also keeps hooks from
//! observing a half-finished change cycle.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::artifacts::manifest::{inject_manifest_link, render_manifest};
use crate::artifacts::sitemap::{SitemapEntry, collect_sitemap_entries, render_sitemap};
use crate::engine::{CycleReport, Orchestrator};
use crate::errors::Result;
use crate::generator::NameKind;
use crate::graph::{is_javascript_like, parse_imports};
use crate::host::{EmittedAsset, HostAdapter, HotUpdate, RESOLVED_PREFIX};
use crate::resolve::patterns::build_globset;
use crate::types::BuildContext;

/// Appended to consumer modules that import synthetic modules.
pub const HOT_ACCEPT_SNIPPET: &str =
    "// autoload: hot reload\nif (import.meta.hot) {\n  import.meta.hot.accept();\n}\n";

/// Counts of what `build_start` emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub chunks: usize,
    pub modules: usize,
    pub types_written: bool,
}

#[derive(Debug, Clone)]
pub struct AutoloadPlugin {
    inner: Arc<Mutex<Orchestrator>>,
}

impl AutoloadPlugin {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(orchestrator)),
        }
    }

    pub fn orchestrator(&self) -> Arc<Mutex<Orchestrator>> {
        Arc::clone(&self.inner)
    }

    /// `virtual:<name>` -> `\0virtual:<name>` when `name` is known.
    pub async fn resolve_id(&self, id: &str) -> Option<String> {
        let orch = self.inner.lock().await;
        orch.name_index()
            .resolve_virtual(id)
            .map(|_| format!("{RESOLVED_PREFIX}{id}"))
    }

    /// Source text for a resolved synthetic module id.
    pub async fn load(&self, id: &str, production: bool) -> Result<Option<String>> {
        let Some(id) = id.strip_prefix(RESOLVED_PREFIX) else {
            return Ok(None);
        };
        let mut orch = self.inner.lock().await;
        let Some((name, kind)) = orch
            .name_index()
            .resolve_virtual(id)
            .map(|(name, entry)| (name.to_string(), entry.kind))
        else {
            return Ok(None);
        };

        let base = if production {
            BuildContext::production()
        } else {
            BuildContext::dev()
        };
        let ctx = match kind {
            NameKind::Group => base.with_name(&name),
            NameKind::Component => base,
        };

        let Some(generator) = orch.generator_for(&name) else {
            return Ok(None);
        };
        let code = generator.code(&ctx).await?;
        debug!(module = %id, bytes = code.len(), "loaded synthetic module");
        Ok(Some(code))
    }

    /// Record which synthetic modules a consumer imports, ask the host to
    /// watch their source files and append hot-accept boilerplate.
    ///
    /// Returns `None` when the module is left untouched.
    pub async fn transform_importer(
        &self,
        code: &str,
        id: &str,
        host: &dyn HostAdapter,
    ) -> Option<String> {
        if id.starts_with(RESOLVED_PREFIX) || !is_javascript_like(id) {
            return None;
        }

        let mut orch = self.inner.lock().await;
        let modules: Vec<String> = parse_imports(code)
            .into_iter()
            .filter(|spec| orch.name_index().resolve_virtual(spec).is_some())
            .collect();
        if modules.is_empty() {
            return None;
        }

        orch.importers_mut().record_dependency(id, &modules);
        for module in &modules {
            if let Some(deps) = orch.tracker().deps_of(module) {
                for path in deps {
                    host.watch_file(path);
                }
            }
        }
        debug!(importer = %id, ?modules, "recorded synthetic imports");

        if code.contains(HOT_ACCEPT_SNIPPET) {
            return Some(code.to_string());
        }
        Some(format!("{code}\n{HOT_ACCEPT_SNIPPET}"))
    }

    /// A tracked source file changed in place: invalidate the importers of
    /// its synthetic module and everything that imports them.
    pub async fn handle_hot_update(&self, file: &Path) -> Vec<String> {
        let orch = self.inner.lock().await;
        let Some(export) = orch.tracker().export_for(file) else {
            return Vec::new();
        };
        let affected: Vec<String> = orch
            .importers()
            .affected_importers([export.virtual_module.as_str()])
            .into_iter()
            .collect();
        if !affected.is_empty() {
            orch.sink().invalidate(&affected);
            orch.sink().notify(&HotUpdate {
                modules: affected.clone(),
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
            });
        }
        affected
    }

    /// Watcher callback: run one change cycle.
    pub async fn on_files_changed(&self, paths: &[PathBuf]) -> CycleReport {
        let mut orch = self.inner.lock().await;
        orch.handle_changes(paths).await
    }

    /// Production build start: write types, emit one chunk per resolved
    /// file and the source of every synthetic module.
    pub async fn build_start(&self, host: &dyn HostAdapter) -> Result<BuildSummary> {
        let ctx = BuildContext::production();
        let mut orch = self.inner.lock().await;
        let mut summary = BuildSummary::default();

        let snapshot = orch.snapshot(&ctx).await?;
        summary.types_written = orch.write_types(&snapshot)?;

        for generator in orch.generators() {
            for file in generator.groups(&ctx) {
                let file_name = file.uri.trim_start_matches('/').to_string();
                host.emit_asset(EmittedAsset::Chunk {
                    source: file.file,
                    file_name,
                })?;
                summary.chunks += 1;
            }
        }

        let names: Vec<(String, NameKind)> = orch
            .name_index()
            .names()
            .filter_map(|n| orch.name_index().lookup(n).map(|e| (n.to_string(), e.kind)))
            .collect();
        for (name, kind) in names {
            let module_ctx = match kind {
                NameKind::Group => ctx.clone().with_name(&name),
                NameKind::Component => ctx.clone(),
            };
            let Some(generator) = orch.generator_for(&name) else {
                continue;
            };
            let source = generator.code(&module_ctx).await?;
            host.emit_asset(EmittedAsset::Asset {
                file_name: format!("virtual/{name}.js"),
                source,
            })?;
            summary.modules += 1;
        }

        info!(
            chunks = summary.chunks,
            modules = summary.modules,
            "emitted production build"
        );
        Ok(summary)
    }

    /// Production build end: sitemap and web manifest.
    pub async fn close_bundle(&self, host: &dyn HostAdapter) -> Result<()> {
        let ctx = BuildContext::production();
        let mut orch = self.inner.lock().await;

        if let Some(sitemap) = orch.settings().sitemap.clone() {
            let snapshot = orch.snapshot(&ctx).await?;
            let entries: Vec<SitemapEntry> = orch
                .generators()
                .iter()
                .filter_map(|g| {
                    let strategy = g.config().strategy.sitemap.as_ref()?;
                    let data = snapshot.get(g.name())?;
                    Some(collect_sitemap_entries(strategy, data))
                })
                .flatten()
                .collect();
            let exclude = if sitemap.exclude.is_empty() {
                None
            } else {
                Some(build_globset(&sitemap.exclude).context("compiling sitemap excludes")?)
            };
            let xml = render_sitemap(&entries, &sitemap.base_url, exclude.as_ref(), chrono::Utc::now());
            host.emit_asset(EmittedAsset::Asset {
                file_name: sitemap.output.clone(),
                source: xml,
            })?;
            info!(urls = entries.len(), output = %sitemap.output, "wrote sitemap");
        }

        if let Some(manifest) = orch.settings().manifest.clone() {
            let json = render_manifest(&manifest)?;
            host.emit_asset(EmittedAsset::Asset {
                file_name: manifest.output.clone(),
                source: json,
            })?;
            info!(output = %manifest.output, "wrote web manifest");
        }

        Ok(())
    }

    /// Add the manifest link to an HTML page when a manifest is configured.
    pub async fn transform_index_html(&self, html: &str) -> String {
        let orch = self.inner.lock().await;
        match &orch.settings().manifest {
            Some(manifest) => inject_manifest_link(html, &manifest.output),
            None => html.to_string(),
        }
    }

    /// Synthetic modules currently imported by `importer`.
    pub async fn imports_of(&self, importer: &str) -> BTreeSet<String> {
        self.inner.lock().await.importers().modules_of(importer)
    }
}
