// src/resolve/data.rs

//! Data-source groups: values produced by zero-argument functions.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::info;

use crate::config::{GroupConfig, GroupInput};
use crate::errors::{AutoloadError, Result};
use crate::pipeline::functions::DataSourceFn;

#[derive(Debug)]
pub struct DataSourceResolver {
    sources: Vec<(String, DataSourceFn)>,
    data: BTreeMap<String, Value>,
    version: u64,
}

impl DataSourceResolver {
    pub fn new(groups: &[GroupConfig]) -> Self {
        let sources = groups
            .iter()
            .filter_map(|g| match &g.input {
                GroupInput::Source(f) => Some((g.name.clone(), f.clone())),
                GroupInput::Files(_) => None,
            })
            .collect();
        Self {
            sources,
            data: BTreeMap::new(),
            version: 0,
        }
    }

    /// Run every producer in declaration order.
    ///
    /// The first failing producer aborts the pass; previously committed data
    /// stays in place and nothing from the failed pass is kept.
    pub async fn initialize(&mut self) -> Result<()> {
        let mut fresh = BTreeMap::new();
        let mut successes: u64 = 0;
        for (name, producer) in &self.sources {
            let value = producer
                .call()
                .await
                .map_err(|e| AutoloadError::ResolutionError {
                    group: name.clone(),
                    message: format!("{e:#}"),
                })?;
            fresh.insert(name.clone(), value);
            successes += 1;
        }
        self.data = fresh;
        self.version += successes;
        if successes > 0 {
            info!(groups = successes, version = self.version, "resolved data sources");
        }
        Ok(())
    }

    pub fn data(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn all_data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Items of a data-source group: an array is the item list, anything else is
/// a single item.
pub fn items_from_value(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}
