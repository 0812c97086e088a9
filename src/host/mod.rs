// src/host/mod.rs

//! Boundary with the host build tool.
//!
//! The core never calls the host directly: emitting files and registering
//! watch paths go through a [`HostAdapter`], and module invalidation plus
//! reload messages go through a [`ReloadSink`].

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::generator::VIRTUAL_PREFIX;

pub mod fs_host;
pub mod plugin;

pub use fs_host::FsHost;
pub use plugin::AutoloadPlugin;

/// Host convention marking an id as already resolved.
pub const RESOLVED_PREFIX: char = '\0';

/// The id the host's module graph knows a module by: synthetic modules
/// carry [`RESOLVED_PREFIX`], real files are left as they are.
pub fn host_module_id(id: &str) -> String {
    if id.starts_with(VIRTUAL_PREFIX) {
        format!("{RESOLVED_PREFIX}{id}")
    } else {
        id.to_string()
    }
}

/// Something the production build hands to the host for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmittedAsset {
    /// A source file emitted as its own chunk under `file_name`.
    Chunk { source: PathBuf, file_name: String },
    /// Generated text written verbatim under `file_name`.
    Asset { file_name: String, source: String },
}

impl EmittedAsset {
    pub fn file_name(&self) -> &str {
        match self {
            EmittedAsset::Chunk { file_name, .. } | EmittedAsset::Asset { file_name, .. } => {
                file_name
            }
        }
    }
}

/// Side effects the plugin hooks need from the host.
pub trait HostAdapter: Send + Sync + Debug {
    fn emit_asset(&self, asset: EmittedAsset) -> Result<()>;
    fn watch_file(&self, path: &Path);
}

/// Reload message pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotUpdate {
    /// Synthetic modules and importers that were invalidated.
    pub modules: Vec<String>,
    pub timestamp_ms: i64,
}

/// Where invalidations and reload notifications go.
pub trait ReloadSink: Send + Sync + Debug {
    /// Drop these modules from the host's module graph.
    fn invalidate(&self, modules: &[String]);
    /// Tell connected clients to reload.
    fn notify(&self, update: &HotUpdate);
}

/// Sink used by the standalone binary: there is no module graph or client,
/// so it only reports what would have been reloaded.
#[derive(Debug, Default, Clone)]
pub struct LoggingReloadSink;

impl ReloadSink for LoggingReloadSink {
    fn invalidate(&self, modules: &[String]) {
        info!(?modules, "invalidated modules");
    }

    fn notify(&self, update: &HotUpdate) {
        info!(
            modules = update.modules.len(),
            timestamp_ms = update.timestamp_ms,
            "sent reload notification"
        );
    }
}
