// src/config/components.rs

//! Runtime component and group configuration.
//!
//! These types carry live function handles, so they are built either from
//! the TOML model (see `config::validate`) or directly in Rust.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::pipeline::functions::{AggregateFn, DataSourceFn, TransformFn};

/// Declarative file match for a file-backed group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileMatchConfig {
    /// Base directory; relative values are resolved against the project root.
    pub directory: String,
    /// Include globs, relative to `directory`.
    pub patterns: Vec<String>,
    /// Exclude globs, relative to `directory`.
    pub ignore: Vec<String>,
    /// Public path prefix used by the URI transform.
    pub prefix: Option<String>,
    /// Metadata copied onto every item under `data`.
    pub data: Option<Map<String, Value>>,
}

impl FileMatchConfig {
    pub fn new<I, S>(directory: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            directory: directory.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_ignore<I, S>(mut self, ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = ignore.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }
}

/// Where a group's items come from.
#[derive(Debug, Clone)]
pub enum GroupInput {
    Files(FileMatchConfig),
    Source(DataSourceFn),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputConfig {
    pub template: Option<String>,
}

/// One group: an input plus optional transform and aggregate.
#[derive(Debug, Clone)]
pub struct GroupConfig {
    pub name: String,
    pub input: GroupInput,
    pub output: OutputConfig,
    pub transform: Option<TransformFn>,
    pub aggregate: Option<AggregateFn>,
}

impl GroupConfig {
    pub fn files(name: impl Into<String>, input: FileMatchConfig) -> Self {
        Self::with_input(name, GroupInput::Files(input))
    }

    pub fn source(name: impl Into<String>, producer: DataSourceFn) -> Self {
        Self::with_input(name, GroupInput::Source(producer))
    }

    fn with_input(name: impl Into<String>, input: GroupInput) -> Self {
        Self {
            name: name.into(),
            input,
            output: OutputConfig::default(),
            transform: None,
            aggregate: None,
        }
    }

    pub fn with_transform(mut self, transform: TransformFn) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_aggregate(mut self, aggregate: AggregateFn) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.output.template = Some(template.into());
        self
    }

    pub fn file_match(&self) -> Option<&FileMatchConfig> {
        match &self.input {
            GroupInput::Files(cfg) => Some(cfg),
            GroupInput::Source(_) => None,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.file_match().and_then(|m| m.prefix.as_deref())
    }
}

/// Generation strategy shared by all groups of a component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Strategy {
    #[serde(default)]
    pub sitemap: Option<SitemapStrategy>,

    #[serde(default)]
    pub types: Option<TypesStrategy>,
}

/// Which item property holds the sitemap route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SitemapStrategy {
    pub property: String,
}

/// Emit `export type <name> = ...` from the given item property.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypesStrategy {
    pub name: String,
    pub property: String,
}

/// A named component and its groups.
#[derive(Debug, Clone)]
pub struct ComponentConfig {
    pub name: String,
    pub strategy: Strategy,
    pub groups: Vec<GroupConfig>,
}

impl ComponentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategy: Strategy::default(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: GroupConfig) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn group(&self, name: &str) -> Option<&GroupConfig> {
        self.groups.iter().find(|g| g.name == name)
    }
}
