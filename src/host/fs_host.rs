// src/host/fs_host.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::artifacts::write_if_changed;
use crate::fs::FileSystem;
use crate::host::{EmittedAsset, HostAdapter};

/// Host adapter that writes emitted files under an output directory.
///
/// Used by `--build`; in dev mode only the watch registrations matter.
#[derive(Debug)]
pub struct FsHost {
    out_dir: PathBuf,
    fs: Arc<dyn FileSystem>,
    watched: Mutex<BTreeSet<PathBuf>>,
}

impl FsHost {
    pub fn new(out_dir: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            out_dir: out_dir.into(),
            fs,
            watched: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Files registered through [`HostAdapter::watch_file`].
    pub fn watched(&self) -> Vec<PathBuf> {
        self.lock_watched().iter().cloned().collect()
    }

    fn lock_watched(&self) -> MutexGuard<'_, BTreeSet<PathBuf>> {
        self.watched
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HostAdapter for FsHost {
    fn emit_asset(&self, asset: EmittedAsset) -> Result<()> {
        let target = self.out_dir.join(asset.file_name());
        match asset {
            EmittedAsset::Chunk { source, .. } => {
                let bytes = self
                    .fs
                    .read(&source)
                    .with_context(|| format!("reading chunk source {:?}", source))?;
                self.fs.write(&target, &bytes)?;
                debug!(?source, ?target, "emitted chunk");
            }
            EmittedAsset::Asset { source, .. } => {
                if write_if_changed(self.fs.as_ref(), &target, &source)? {
                    info!(?target, "emitted asset");
                }
            }
        }
        Ok(())
    }

    fn watch_file(&self, path: &Path) {
        if self.lock_watched().insert(path.to_path_buf()) {
            debug!(?path, "watching file");
        }
    }
}
