// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Turning `notify` events under the watched directories into settled
//!   change notifications for the engine.
//! - Content hashing used to tell real changes from no-op rewrites.
//!
//! It does not know about components or modules; the orchestrator decides
//! what a changed path means.

pub mod hash;
pub mod path_utils;
pub mod watcher;

pub use hash::{ChangeCache, HashStore, MemoryHashStore, compute_file_hash, stable_hash};
pub use watcher::{WatchOptions, WatcherHandle, spawn_watcher, wait_for_stable};
