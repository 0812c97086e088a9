use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use autoload::host::{EmittedAsset, HostAdapter, HotUpdate, ReloadSink};

/// A reload sink that records every invalidation and notification.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    invalidated: Arc<Mutex<Vec<Vec<String>>>>,
    notified: Arc<Mutex<Vec<HotUpdate>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidations(&self) -> Vec<Vec<String>> {
        self.invalidated.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<HotUpdate> {
        self.notified.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.invalidated.lock().unwrap().clear();
        self.notified.lock().unwrap().clear();
    }
}

impl ReloadSink for RecordingSink {
    fn invalidate(&self, modules: &[String]) {
        self.invalidated.lock().unwrap().push(modules.to_vec());
    }

    fn notify(&self, update: &HotUpdate) {
        self.notified.lock().unwrap().push(update.clone());
    }
}

/// A host adapter that keeps emitted assets and watch registrations in
/// memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    emitted: Arc<Mutex<Vec<EmittedAsset>>>,
    watched: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> Vec<EmittedAsset> {
        self.emitted.lock().unwrap().clone()
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.watched.lock().unwrap().clone()
    }

    /// Source of the emitted asset named `file_name`.
    pub fn asset_source(&self, file_name: &str) -> Option<String> {
        self.emitted().into_iter().find_map(|a| match a {
            EmittedAsset::Asset { file_name: f, source } if f == file_name => Some(source),
            _ => None,
        })
    }
}

impl HostAdapter for RecordingHost {
    fn emit_asset(&self, asset: EmittedAsset) -> anyhow::Result<()> {
        self.emitted.lock().unwrap().push(asset);
        Ok(())
    }

    fn watch_file(&self, path: &Path) {
        self.watched.lock().unwrap().push(path.to_path_buf());
    }
}
