// src/watch/hash.rs

//! Content hashing for change detection.
//!
//! Generated data is hashed through a canonical serialization (object keys
//! sorted, no whitespace) fed into 64-bit FNV-1a. Two logically equal values
//! hash the same regardless of key insertion order. The serializer keeps an
//! explicit stack, so nesting depth is bounded only by memory.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use serde_json::{Map, Value};
use tracing::debug;

use crate::fs::FileSystem;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over raw bytes.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

/// Stable hex hash of a JSON value.
pub fn stable_hash(value: &Value) -> String {
    format!("{:016x}", fnv1a64(canonical_json(value).as_bytes()))
}

/// Stable hex hash of a JSON object.
pub fn stable_hash_map(map: &Map<String, Value>) -> String {
    let mut out = String::new();
    write_canonical(&mut out, Frame::Object(map));
    format!("{:016x}", fnv1a64(out.as_bytes()))
}

/// Canonical, key-sorted JSON text for `value`.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(&mut out, Frame::Value(value));
    out
}

enum Frame<'a> {
    Value(&'a Value),
    Object(&'a Map<String, Value>),
    Key(&'a str),
    Raw(&'static str),
}

fn write_canonical(out: &mut String, root: Frame<'_>) {
    let mut stack = vec![root];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Raw(s) => out.push_str(s),
            Frame::Key(k) => {
                push_json_string(out, k);
                out.push(':');
            }
            Frame::Object(map) => {
                out.push('{');
                stack.push(Frame::Raw("}"));
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                for (i, key) in keys.into_iter().enumerate().rev() {
                    stack.push(Frame::Value(&map[key.as_str()]));
                    stack.push(Frame::Key(key.as_str()));
                    if i > 0 {
                        stack.push(Frame::Raw(","));
                    }
                }
            }
            Frame::Value(value) => match value {
                Value::Null => out.push_str("null"),
                Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
                Value::Number(n) => out.push_str(&n.to_string()),
                Value::String(s) => push_json_string(out, s),
                Value::Array(items) => {
                    out.push('[');
                    stack.push(Frame::Raw("]"));
                    for (i, item) in items.iter().enumerate().rev() {
                        stack.push(Frame::Value(item));
                        if i > 0 {
                            stack.push(Frame::Raw(","));
                        }
                    }
                }
                Value::Object(map) => stack.push(Frame::Object(map)),
            },
        }
    }
}

fn push_json_string(out: &mut String, s: &str) {
    // Serializing a &str cannot fail.
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
    }
}

/// blake3 hex digest of a file's bytes.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let bytes = fs
        .read(path)
        .with_context(|| format!("reading file for hashing: {:?}", path))?;
    let mut hasher = Hasher::new();
    hasher.update(&bytes);
    Ok(hasher.finalize().to_hex().to_string())
}

/// Abstract storage for per-name content hashes.
pub trait HashStore: Send + Sync {
    fn load(&self, name: &str) -> Option<String>;
    fn save(&mut self, name: &str, hash: &str);
    /// Remove hashes for names that are not in `active`.
    fn prune(&mut self, active: &[&str]);
    fn clear(&mut self);
}

/// Stores hashes in memory only; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<String, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, name: &str) -> Option<String> {
        self.map.get(name).cloned()
    }

    fn save(&mut self, name: &str, hash: &str) {
        self.map.insert(name.to_string(), hash.to_string());
    }

    fn prune(&mut self, active: &[&str]) {
        self.map.retain(|k, _| active.contains(&k.as_str()));
    }

    fn clear(&mut self) {
        self.map.clear();
    }
}

/// Compares generated data against the last committed hash per name.
pub struct ChangeCache {
    store: Box<dyn HashStore>,
}

impl std::fmt::Debug for ChangeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeCache").finish_non_exhaustive()
    }
}

impl Default for ChangeCache {
    fn default() -> Self {
        Self::new(Box::new(MemoryHashStore::new()))
    }
}

impl ChangeCache {
    pub fn new(store: Box<dyn HashStore>) -> Self {
        Self { store }
    }

    /// Hash `data`, compare with the stored hash for `name` and commit the
    /// new hash when it differs.
    ///
    /// A name seen for the first time counts as changed.
    pub fn has_changed(&mut self, name: &str, data: &Map<String, Value>) -> bool {
        let hash = stable_hash_map(data);
        let previous = self.store.load(name);
        if previous.as_deref() == Some(hash.as_str()) {
            return false;
        }
        debug!(name = %name, hash = %hash, ?previous, "content hash changed");
        self.store.save(name, &hash);
        true
    }

    /// Record `data` as the baseline for `name` without reporting a change.
    pub fn record(&mut self, name: &str, data: &Map<String, Value>) {
        let hash = stable_hash_map(data);
        self.store.save(name, &hash);
    }

    pub fn stored(&self, name: &str) -> Option<String> {
        self.store.load(name)
    }

    pub fn prune(&mut self, active: &[&str]) {
        self.store.prune(active);
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }
}
