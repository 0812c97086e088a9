// src/config/loader.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::validate::build_config;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::path_utils::resolve_against;

/// Load a configuration file and return the raw, unvalidated model.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] to get
/// runtime component configs.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    load_from_path_with(path, &RealFileSystem)
}

fn load_from_path_with(path: impl AsRef<Path>, fs: &dyn FileSystem) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs
        .read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    parse_str(&contents).with_context(|| format!("parsing TOML config from {:?}", path))
}

/// Parse TOML text into the raw model.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load, resolve `root_dir` against the config file's directory and
/// validate.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    load_and_validate_with(path, Arc::new(RealFileSystem))
}

/// [`load_and_validate`] over an arbitrary filesystem.
pub fn load_and_validate_with(path: impl AsRef<Path>, fs: Arc<dyn FileSystem>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let mut raw = load_from_path_with(path, fs.as_ref())?;
    let root = resolve_against(&config_dir(path), &raw.settings.root_dir);
    // Watcher events carry absolute paths; keep the root comparable.
    raw.settings.root_dir = fs.canonicalize(&root).unwrap_or(root);

    let config = build_config(raw, fs)
        .with_context(|| format!("validating config from {:?}", path))?;
    Ok(config)
}

/// Directory containing the config file, or `.`.
fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
