// src/pipeline/builtins.rs

//! Transforms, aggregates and producers that can be named from TOML.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use serde_json::Value;

use crate::config::model::{AggregateSpec, BuiltinTransform};
use crate::fs::FileSystem;
use crate::pipeline::functions::{AggregateFn, DataSourceFn, TransformFn};
use crate::watch::hash::{canonical_json, compute_file_hash};

/// Build the transform for a list of builtin names.
pub fn transform_from_builtins(
    names: &[BuiltinTransform],
    fs: &Arc<dyn FileSystem>,
) -> Option<TransformFn> {
    let steps: Vec<TransformFn> = names
        .iter()
        .map(|name| match name {
            BuiltinTransform::Route => route_transform(),
            BuiltinTransform::Fingerprint => fingerprint_transform(Arc::clone(fs)),
        })
        .collect();
    match steps.len() {
        0 => None,
        1 => steps.into_iter().next(),
        _ => Some(TransformFn::chain(steps)),
    }
}

/// Adds `route`, derived from the item's `path`.
pub fn route_transform() -> TransformFn {
    TransformFn::new(|mut item, _ctx| {
        let path = item
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("item has no string `path`"))?;
        let route = route_for_path(path);
        item["route"] = Value::String(route);
        Ok(item)
    })
}

/// `about.tsx` -> `/about`, `blog/index.tsx` -> `/blog`, `index.tsx` -> `/`.
pub fn route_for_path(path: &str) -> String {
    let stem = match path.rfind('.') {
        Some(dot) if !path[dot..].contains('/') => &path[..dot],
        _ => path,
    };
    let stem = if stem == "index" {
        ""
    } else {
        stem.strip_suffix("/index").unwrap_or(stem)
    };
    format!("/{}", stem.trim_matches('/'))
}

/// Adds `hash`, a blake3 digest of the backing file's bytes.
pub fn fingerprint_transform(fs: Arc<dyn FileSystem>) -> TransformFn {
    TransformFn::from_async(move |mut item: Value, _ctx| {
        let fs = Arc::clone(&fs);
        async move {
            let file = item
                .get("file")
                .and_then(Value::as_str)
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("item has no string `file`"))?;
            let hash = tokio::task::spawn_blocking(move || compute_file_hash(fs.as_ref(), &file))
                .await
                .context("hashing task panicked")??;
            item["hash"] = Value::String(hash);
            Ok(item)
        }
    })
}

/// Aggregate built from `sort_by` / `unique_by` / `reverse`.
pub fn aggregate_from_spec(spec: &AggregateSpec) -> Option<AggregateFn> {
    if spec == &AggregateSpec::default() {
        return None;
    }
    let spec = spec.clone();
    Some(AggregateFn::new(move |mut items| {
        if let Some(key) = &spec.unique_by {
            let mut seen = HashSet::new();
            items.retain(|item| match item.get(key) {
                Some(v) => seen.insert(canonical_json(v)),
                None => true,
            });
        }
        if let Some(key) = &spec.sort_by {
            items.sort_by(|a, b| compare_values(a.get(key), b.get(key)));
        }
        if spec.reverse {
            items.reverse();
        }
        Ok(Value::Array(items))
    }))
}

/// Order used by `sort_by`: missing values last, numbers numerically,
/// strings lexically, anything else by canonical text.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => canonical_json(x).cmp(&canonical_json(y)),
    }
}

/// Producer reading a JSON document when the generator initializes.
pub fn json_file_source(fs: Arc<dyn FileSystem>, path: PathBuf) -> DataSourceFn {
    DataSourceFn::from_async(move || {
        let fs = Arc::clone(&fs);
        let path = path.clone();
        async move {
            let text = tokio::task::spawn_blocking(move || fs.read_to_string(&path))
                .await
                .context("reading task panicked")??;
            let value: Value = serde_json::from_str(&text).context("parsing data source JSON")?;
            Ok(value)
        }
    })
}
