// src/generator/collection.rs

//! The collection generator binds one component to its resolvers, the data
//! processor and a content generator.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::{ComponentConfig, GroupInput};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::generator::codegen::{ContentGenerator, TemplateGenerator};
use crate::pipeline::{DataProcessor, GroupData};
use crate::resolve::data::items_from_value;
use crate::resolve::{DataSourceResolver, FileResolver, ResolvedFile};
use crate::types::{BuildContext, TransformErrorPolicy};
use crate::watch::hash::stable_hash;

type Versions = (BTreeMap<String, u64>, u64);

#[derive(Debug)]
pub struct CollectionGenerator {
    config: ComponentConfig,
    files: FileResolver,
    sources: DataSourceResolver,
    processor: DataProcessor,
    content: Box<dyn ContentGenerator>,
    memo: HashMap<String, GroupData>,
    memo_versions: Option<Versions>,
}

impl CollectionGenerator {
    /// Build the resolvers and run the initial scan and producers.
    ///
    /// Invalid patterns, missing directories and failing producers are
    /// returned as errors.
    pub async fn initialize(
        config: ComponentConfig,
        fs: Arc<dyn FileSystem>,
        root: &Path,
        policy: TransformErrorPolicy,
    ) -> Result<Self> {
        let mut files = FileResolver::new(fs, root, &config.groups)?;
        files.initialize()?;

        let mut sources = DataSourceResolver::new(&config.groups);
        sources.initialize().await?;

        let processor = DataProcessor::new(&config.groups, policy);
        let content = Box::new(TemplateGenerator::from_component(&config));

        info!(
            component = %config.name,
            groups = config.groups.len(),
            files = files.file_count(),
            "initialized generator"
        );

        Ok(Self {
            config,
            files,
            sources,
            processor,
            content,
            memo: HashMap::new(),
            memo_versions: None,
        })
    }

    /// Replace the content generator used by [`CollectionGenerator::code`].
    pub fn with_content_generator(mut self, content: Box<dyn ContentGenerator>) -> Self {
        self.content = content;
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    /// Every resolved file across groups, with its public uri.
    pub fn groups(&self, ctx: &BuildContext) -> Vec<ResolvedFile> {
        let uris = self.processor.uris();
        self.files
            .entries()
            .into_iter()
            .flat_map(|entry| {
                let prefix = self
                    .config
                    .group(&entry.name)
                    .and_then(|g| g.prefix())
                    .map(str::to_string);
                entry.files.into_iter().map(move |mut file| {
                    file.uri = uris.transform(&file.uri, prefix.as_deref(), ctx.production);
                    file
                })
            })
            .collect()
    }

    /// Processed data, filtered to `ctx.name` when it names a group.
    pub async fn data(&mut self, ctx: &BuildContext) -> Result<GroupData> {
        let full = self.full_data(ctx).await?;
        Ok(self.filter_for(full, ctx.name.as_deref()))
    }

    /// Module source for `ctx`.
    pub async fn code(&mut self, ctx: &BuildContext) -> Result<String> {
        let data = self.data(ctx).await?;
        self.content.generate(&data, ctx)
    }

    async fn full_data(&mut self, ctx: &BuildContext) -> Result<GroupData> {
        let versions: Versions = (self.files.versions(), self.sources.version());
        if self.memo_versions.as_ref() != Some(&versions) {
            self.memo.clear();
            self.memo_versions = Some(versions.clone());
        }

        let key = stable_hash(&json!({
            "context": {
                "production": ctx.production,
                "environment": ctx.environment.to_string(),
            },
            "files": versions.0,
            "data": versions.1,
        }));

        if let Some(hit) = self.memo.get(&key) {
            debug!(component = %self.config.name, "data cache hit");
            return Ok(hit.clone());
        }

        let input = self.collect_input();
        let processed = self.processor.process_entries(input, ctx).await?;
        self.memo.insert(key, processed.clone());
        Ok(processed)
    }

    fn collect_input(&self) -> Vec<(String, Vec<Value>)> {
        self.config
            .groups
            .iter()
            .map(|group| {
                let items = match &group.input {
                    GroupInput::Files(m) => self
                        .files
                        .group_files(&group.name)
                        .unwrap_or_default()
                        .iter()
                        .map(|f| f.to_value(m.data.as_ref()))
                        .collect(),
                    GroupInput::Source(_) => self
                        .sources
                        .data(&group.name)
                        .map(items_from_value)
                        .unwrap_or_default(),
                };
                (group.name.clone(), items)
            })
            .collect()
    }

    fn filter_for(&self, data: GroupData, name: Option<&str>) -> GroupData {
        match name {
            Some(n) if n != self.config.name => {
                data.into_iter().filter(|(k, _)| k == n).collect()
            }
            _ => data,
        }
    }

    pub fn has_file(&self, path: &Path) -> bool {
        self.files.has_file(path)
    }

    /// Returns true when at least one group took the file.
    pub fn add_file(&mut self, path: &Path) -> bool {
        !self.files.add_file(path).is_empty()
    }

    pub fn remove_file(&mut self, path: &Path) -> bool {
        !self.files.remove_file(path).is_empty()
    }

    /// Pick up the files of a directory that appeared.
    pub fn add_tree(&mut self, dir: &Path) -> bool {
        !self.files.add_tree(dir).is_empty()
    }

    /// Forget the files of a directory that disappeared.
    pub fn remove_under(&mut self, dir: &Path) -> bool {
        !self.files.remove_under(dir).is_empty()
    }

    /// Re-resolve a tracked file whose content changed.
    pub fn touch_file(&mut self, path: &Path) -> bool {
        !self.files.touch_file(path).is_empty()
    }

    /// Whether `name` is this component or one of its groups.
    pub fn find_group(&self, name: &str) -> bool {
        name == self.config.name || self.config.group(name).is_some()
    }

    /// Re-run the data-source producers.
    pub async fn reload_sources(&mut self) -> Result<()> {
        self.sources.initialize().await
    }

    pub fn file_count(&self) -> usize {
        self.files.file_count()
    }

    pub fn directories(&self) -> Vec<PathBuf> {
        self.files.directories()
    }

    /// Whether a new file at `path` would be picked up by any group.
    pub fn accepts(&self, path: &Path) -> bool {
        self.files.accepts(path)
    }
}
