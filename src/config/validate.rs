// src/config/validate.rs

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::components::{ComponentConfig, FileMatchConfig, GroupConfig};
use crate::config::model::{
    ComponentSpec, ConfigFile, DataSpec, FileMatchSpec, GroupSpec, InputSpec, RawConfigFile,
    Settings,
};
use crate::errors::{AutoloadError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::generator::NameIndex;
use crate::pipeline::builtins::{aggregate_from_spec, json_file_source, transform_from_builtins};
use crate::pipeline::functions::DataSourceFn;
use crate::resolve::patterns::build_globset;
use crate::types::Metadata;
use crate::watch::path_utils::resolve_against;

/// Run semantic validation on a parsed config and convert it into runtime
/// component configs.
///
/// This checks:
/// - there is at least one component, and every component and group has a
///   non-empty name
/// - `chunk_size >= 1` and `[settings.watch].queue_length >= 1`
/// - every data input sets exactly one of `value` / `json_file`
/// - every glob compiles
/// - component and group names are unique across the whole config
///
/// It does **not** check that input directories exist; that happens when
/// the generators initialize.
pub fn build_config(raw: RawConfigFile, fs: Arc<dyn FileSystem>) -> Result<ConfigFile> {
    ensure_has_components(&raw)?;
    validate_settings(&raw.settings)?;
    for component in &raw.components {
        validate_component(component)?;
    }

    let components = raw
        .components
        .into_iter()
        .map(|spec| convert_component(spec, &raw.settings, &fs))
        .collect::<Result<Vec<_>>>()?;

    NameIndex::new(&components)?;

    Ok(ConfigFile::new_unchecked(raw.settings, components))
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AutoloadError;

    fn try_from(raw: RawConfigFile) -> Result<Self> {
        build_config(raw, Arc::new(RealFileSystem))
    }
}

fn config_error(message: impl Into<String>) -> AutoloadError {
    AutoloadError::ConfigError(message.into())
}

fn ensure_has_components(raw: &RawConfigFile) -> Result<()> {
    if raw.components.is_empty() {
        return Err(config_error(
            "config must contain at least one [[component]] section",
        ));
    }
    Ok(())
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.chunk_size == 0 {
        return Err(config_error("[settings].chunk_size must be >= 1 (got 0)"));
    }
    if settings.watch.queue_length == 0 {
        return Err(config_error(
            "[settings.watch].queue_length must be >= 1 (got 0)",
        ));
    }
    if let Some(sitemap) = &settings.sitemap {
        build_globset(&sitemap.exclude)
            .map_err(|e| config_error(format!("[settings.sitemap].exclude: {e:#}")))?;
    }
    Ok(())
}

fn validate_component(component: &ComponentSpec) -> Result<()> {
    if component.name.trim().is_empty() {
        return Err(config_error("component name must not be empty"));
    }
    for group in &component.groups {
        validate_group(&component.name, group)?;
    }
    Ok(())
}

fn validate_group(component: &str, group: &GroupSpec) -> Result<()> {
    if group.name.trim().is_empty() {
        return Err(config_error(format!(
            "component '{component}' has a group with an empty name"
        )));
    }
    match &group.input {
        InputSpec::Files(files) => validate_file_match(component, &group.name, files),
        InputSpec::Data(data) => validate_data(component, &group.name, data),
    }
}

fn validate_file_match(component: &str, group: &str, files: &FileMatchSpec) -> Result<()> {
    let include = files.patterns.clone().into_vec();
    if include.is_empty() {
        return Err(config_error(format!(
            "group '{component}.{group}' has an empty `match` list"
        )));
    }
    build_globset(&include)
        .map_err(|e| config_error(format!("group '{component}.{group}' match: {e:#}")))?;
    if let Some(ignore) = &files.ignore {
        build_globset(&ignore.clone().into_vec())
            .map_err(|e| config_error(format!("group '{component}.{group}' ignore: {e:#}")))?;
    }
    Ok(())
}

fn validate_data(component: &str, group: &str, data: &DataSpec) -> Result<()> {
    match (&data.value, &data.json_file) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(config_error(format!(
            "group '{component}.{group}' input must set exactly one of `value` or `json_file`"
        ))),
    }
}

fn convert_component(
    spec: ComponentSpec,
    settings: &Settings,
    fs: &Arc<dyn FileSystem>,
) -> Result<ComponentConfig> {
    let mut component = ComponentConfig::new(spec.name).with_strategy(spec.strategy);
    for group in spec.groups {
        component = component.with_group(convert_group(group, settings, fs)?);
    }
    Ok(component)
}

fn convert_group(
    spec: GroupSpec,
    settings: &Settings,
    fs: &Arc<dyn FileSystem>,
) -> Result<GroupConfig> {
    let mut group = match spec.input {
        InputSpec::Files(files) => GroupConfig::files(&spec.name, convert_file_match(files)?),
        InputSpec::Data(data) => GroupConfig::source(&spec.name, convert_data(data, settings, fs)?),
    };

    if let Some(transform) = transform_from_builtins(&spec.transform, fs) {
        group = group.with_transform(transform);
    }
    if let Some(aggregate) = spec.aggregate.as_ref().and_then(aggregate_from_spec) {
        group = group.with_aggregate(aggregate);
    }
    if let Some(template) = spec.output.template {
        group = group.with_template(template);
    }
    Ok(group)
}

fn convert_file_match(spec: FileMatchSpec) -> Result<FileMatchConfig> {
    let mut cfg = FileMatchConfig::new(spec.directory, spec.patterns.into_vec());
    if let Some(ignore) = spec.ignore {
        cfg = cfg.with_ignore(ignore.into_vec());
    }
    if let Some(prefix) = spec.prefix {
        cfg = cfg.with_prefix(prefix);
    }
    if let Some(table) = spec.data {
        cfg = cfg.with_data(metadata_from_table(table)?);
    }
    Ok(cfg)
}

/// TOML metadata -> item metadata. A table holding exactly `import` and
/// `export` strings becomes a deferred import; everything else is kept
/// as plain data.
fn metadata_from_table(table: toml::Table) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    for (key, value) in table {
        let converted = match deferred_import(&value) {
            Some(meta) => serde_json::to_value(meta)?,
            None => serde_json::to_value(value)?,
        };
        out.insert(key, converted);
    }
    Ok(out)
}

fn deferred_import(value: &toml::Value) -> Option<Metadata> {
    let table = value.as_table()?;
    if table.len() != 2 {
        return None;
    }
    let module_path = table.get("import")?.as_str()?;
    let export_name = table.get("export")?.as_str()?;
    Some(Metadata::deferred(module_path, export_name))
}

fn convert_data(
    spec: DataSpec,
    settings: &Settings,
    fs: &Arc<dyn FileSystem>,
) -> Result<DataSourceFn> {
    match (spec.value, spec.json_file) {
        (Some(value), _) => Ok(DataSourceFn::constant(serde_json::to_value(value)?)),
        (None, Some(file)) => {
            let path = resolve_against(&settings.root_dir, Path::new(&file));
            Ok(json_file_source(Arc::clone(fs), path))
        }
        (None, None) => Err(config_error(
            "data input must set one of `value` or `json_file`",
        )),
    }
}
