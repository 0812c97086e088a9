// src/watch/path_utils.rs

//! Utility functions for path handling.

use std::path::{Component, Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    // macOS hands out /private/var/... for /var/... and friends.
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

/// Render a path with forward slashes regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Lexically normalise a path: drop `.` segments and fold `..` into the
/// preceding segment. Does not touch the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Join `rel` onto `base` unless it is already absolute, then normalise.
pub fn resolve_against(base: &Path, rel: &Path) -> PathBuf {
    if rel.is_absolute() {
        normalize(rel)
    } else {
        normalize(&base.join(rel))
    }
}

/// Paths the watcher and the scanner never look at: dotfiles, editor temp
/// files and anything inside `node_modules`.
pub fn is_ignored_path(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name == "node_modules" || (name.starts_with('.') && name.len() > 1)
        }
        _ => false,
    }) || path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext == "tmp" || ext == "temp")
}
