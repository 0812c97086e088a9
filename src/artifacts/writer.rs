// src/artifacts/writer.rs

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;

/// Write `contents` unless the file already holds exactly these bytes.
///
/// Returns whether a write happened.
pub fn write_if_changed(fs: &dyn FileSystem, path: &Path, contents: &str) -> Result<bool> {
    if fs.is_file(path) {
        if let Ok(existing) = fs.read(path) {
            if existing == contents.as_bytes() {
                debug!(?path, "artifact unchanged; skipping write");
                return Ok(false);
            }
        }
    }
    fs.write(path, contents.as_bytes())?;
    debug!(?path, bytes = contents.len(), "wrote artifact");
    Ok(true)
}
