// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::artifacts::manifest::ManifestConfig;
use crate::cli::LogLevel;
use crate::config::components::{ComponentConfig, Strategy};
use crate::types::{BurstBehaviour, TransformErrorPolicy};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [settings]
/// root_dir = "."
///
/// [settings.export]
/// types = "src/autogen.d.ts"
///
/// [[component]]
/// name = "routes"
///
/// [[component.group]]
/// name = "views"
/// transform = ["route"]
/// input = { directory = "src/pages", match = "**/*.tsx" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default, rename = "component")]
    pub components: Vec<ComponentSpec>,
}

/// Validated configuration: settings plus runtime component configs.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub settings: Settings,
    pub components: Vec<ComponentConfig>,
}

impl ConfigFile {
    /// Assemble a config without running validation.
    pub fn new_unchecked(settings: Settings, components: Vec<ComponentConfig>) -> Self {
        Self {
            settings,
            components,
        }
    }
}

/// `[settings]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Project root; relative values are resolved against the config file's
    /// directory by the loader.
    #[serde(default = "default_root_dir", alias = "rootDir")]
    pub root_dir: PathBuf,

    #[serde(default, alias = "logLevel")]
    pub log_level: Option<LogLevel>,

    /// Batch size used when rebuilding the dependency maps.
    #[serde(default = "default_chunk_size", alias = "chunkSize")]
    pub chunk_size: usize,

    #[serde(default)]
    pub export: ExportSettings,

    #[serde(default)]
    pub watch: WatchSettings,

    #[serde(default)]
    pub sitemap: Option<SitemapSettings>,

    #[serde(default)]
    pub manifest: Option<ManifestConfig>,

    #[serde(default)]
    pub build: BuildSettings,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_chunk_size() -> usize {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            log_level: None,
            chunk_size: default_chunk_size(),
            export: ExportSettings::default(),
            watch: WatchSettings::default(),
            sitemap: None,
            manifest: None,
            build: BuildSettings::default(),
        }
    }
}

impl Settings {
    /// Absolute (or root-relative) path of the generated type declarations.
    pub fn types_path(&self) -> Option<PathBuf> {
        self.export.types.as_ref().map(|p| self.root_dir.join(p))
    }
}

/// `[settings.export]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExportSettings {
    /// Output path for generated type declarations.
    #[serde(default)]
    pub types: Option<String>,
}

/// `[settings.watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSettings {
    #[serde(default = "default_debounce_ms", alias = "debounceTime")]
    pub debounce_ms: u64,

    /// How long a file's size must stay unchanged before its event is
    /// forwarded.
    #[serde(default = "default_stability_threshold_ms", alias = "stabilityThreshold")]
    pub stability_threshold_ms: u64,

    /// `"merge"` (default) or `"queue"`.
    #[serde(default)]
    pub burst_behaviour: BurstBehaviour,

    /// Maximum number of pending bursts remembered in `"queue"` mode.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_stability_threshold_ms() -> u64 {
    300
}

fn default_queue_length() -> usize {
    1
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            stability_threshold_ms: default_stability_threshold_ms(),
            burst_behaviour: BurstBehaviour::default(),
            queue_length: default_queue_length(),
        }
    }
}

/// `[settings.sitemap]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SitemapSettings {
    #[serde(default = "default_sitemap_output")]
    pub output: String,

    #[serde(alias = "baseUrl")]
    pub base_url: String,

    /// Globs matched against routes that should not be listed.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_sitemap_output() -> String {
    "sitemap.xml".to_string()
}

/// `[settings.build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_out_dir", alias = "outDir")]
    pub out_dir: String,

    #[serde(default)]
    pub transform_errors: TransformErrorPolicy,
}

fn default_out_dir() -> String {
    "dist".to_string()
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            transform_errors: TransformErrorPolicy::default(),
        }
    }
}

/// `[[component]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentSpec {
    pub name: String,

    #[serde(default)]
    pub strategy: Strategy,

    #[serde(default, rename = "group")]
    pub groups: Vec<GroupSpec>,
}

/// `[[component.group]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupSpec {
    pub name: String,

    pub input: InputSpec,

    #[serde(default)]
    pub output: OutputSpec,

    /// Builtin transforms applied in order.
    #[serde(default)]
    pub transform: Vec<BuiltinTransform>,

    #[serde(default)]
    pub aggregate: Option<AggregateSpec>,
}

/// A group reads either files or a data source.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InputSpec {
    Files(FileMatchSpec),
    Data(DataSpec),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileMatchSpec {
    pub directory: String,

    #[serde(rename = "match")]
    pub patterns: Patterns,

    #[serde(default)]
    pub ignore: Option<Patterns>,

    #[serde(default)]
    pub prefix: Option<String>,

    /// Extra metadata attached to every item of the group. A table of the
    /// form `{ import = "...", export = "..." }` becomes a deferred import.
    #[serde(default)]
    pub data: Option<toml::Table>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSpec {
    /// Inline data.
    #[serde(default)]
    pub value: Option<toml::Value>,

    /// JSON file read when the generator initializes (relative to root).
    #[serde(default)]
    pub json_file: Option<String>,
}

/// A single glob or a list of globs.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Patterns::One(p) => vec![p],
            Patterns::Many(ps) => ps,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputSpec {
    /// Module template; `{key}` and `{{ data }}` are substituted.
    #[serde(default)]
    pub template: Option<String>,
}

/// Transforms that can be named from TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinTransform {
    /// Derive `route` from `path`.
    Route,
    /// Add a content hash of the backing file.
    Fingerprint,
}

/// Builtin aggregate options.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct AggregateSpec {
    #[serde(default)]
    pub sort_by: Option<String>,

    #[serde(default)]
    pub unique_by: Option<String>,

    #[serde(default)]
    pub reverse: bool,
}
