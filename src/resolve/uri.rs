// src/resolve/uri.rs

//! Public path computation for resolved items.
//!
//! Development paths are `prefix + uri`. Production paths are
//! `prefix + digest(uri) + ".js"`, a pure function of the uri string.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Length in hex characters of the production digest.
const DIGEST_LEN: usize = 32;

/// Compute the public path for `uri` without caching.
pub fn transform_uri(uri: &str, prefix: Option<&str>, production: bool) -> String {
    let mut base = match prefix {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => "/".to_string(),
    };
    if !base.ends_with('/') {
        base.push('/');
    }

    let joined = if production {
        format!("{base}{}.js", uri_digest(uri))
    } else {
        format!("{base}{uri}")
    };
    collapse_slashes(&joined)
}

/// Truncated blake3 hex digest of a uri string.
pub fn uri_digest(uri: &str) -> String {
    let hex = blake3::hash(uri.as_bytes()).to_hex();
    hex.as_str()[..DIGEST_LEN].to_string()
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(ch);
    }
    out
}

type UriKey = (String, Option<String>, bool);

/// Memoizing wrapper around [`transform_uri`].
#[derive(Debug, Default)]
pub struct UriTransformer {
    cache: Mutex<HashMap<UriKey, String>>,
}

impl UriTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self, uri: &str, prefix: Option<&str>, production: bool) -> String {
        let key = (uri.to_string(), prefix.map(str::to_string), production);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(key)
            .or_insert_with(|| transform_uri(uri, prefix, production))
            .clone()
    }

    /// Number of distinct `(uri, prefix, production)` triples computed so far.
    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
