// src/pipeline/processor.rs

//! Two-pass data processor.
//!
//! Pass 1 transforms every item of every group in declaration order. Each
//! transform sees the output of the groups processed before its own through
//! [`TransformContext::data`]. Pass 2 runs each group's aggregate over its
//! complete transformed list, after every group has been transformed.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::GroupConfig;
use crate::errors::{AutoloadError, Result};
use crate::pipeline::GroupData;
use crate::pipeline::functions::{AggregateFn, TransformContext, TransformFn};
use crate::resolve::UriTransformer;
use crate::types::{BuildContext, TransformErrorPolicy};

#[derive(Debug, Clone)]
struct GroupRule {
    transform: Option<TransformFn>,
    aggregate: Option<AggregateFn>,
    prefix: Option<String>,
}

#[derive(Debug)]
pub struct DataProcessor {
    rules: HashMap<String, GroupRule>,
    policy: TransformErrorPolicy,
    uris: UriTransformer,
}

impl DataProcessor {
    pub fn new(groups: &[GroupConfig], policy: TransformErrorPolicy) -> Self {
        let rules = groups
            .iter()
            .map(|g| {
                (
                    g.name.clone(),
                    GroupRule {
                        transform: g.transform.clone(),
                        aggregate: g.aggregate.clone(),
                        prefix: g.prefix().map(str::to_string),
                    },
                )
            })
            .collect();
        Self {
            rules,
            policy,
            uris: UriTransformer::new(),
        }
    }

    pub fn uris(&self) -> &UriTransformer {
        &self.uris
    }

    /// Transform then aggregate `input`, which must be in declaration order.
    pub async fn process_entries(
        &self,
        input: Vec<(String, Vec<Value>)>,
        ctx: &BuildContext,
    ) -> Result<GroupData> {
        let mut result = GroupData::new();

        for (name, items) in input {
            let Some(rule) = self.rules.get(&name) else {
                warn!(group = %name, items = items.len(), "no config for group; skipping it");
                continue;
            };

            let items: Vec<Value> = items
                .into_iter()
                .map(|item| self.rewrite_uri(item, rule.prefix.as_deref(), ctx.production))
                .collect();

            let transformed = match &rule.transform {
                Some(transform) => {
                    let tctx = TransformContext {
                        data: Arc::new(result.clone()),
                        production: ctx.production,
                        environment: ctx.environment,
                        group: name.clone(),
                    };
                    let outcomes =
                        join_all(items.into_iter().map(|item| transform.call(item, tctx.clone())))
                            .await;
                    settle(&name, outcomes, self.policy)?
                }
                None => items,
            };

            debug!(group = %name, items = transformed.len(), "transformed group");
            result.insert(name, Value::Array(transformed));
        }

        for (name, value) in result.iter_mut() {
            let Some(aggregate) = self.rules.get(name).and_then(|r| r.aggregate.as_ref()) else {
                continue;
            };
            let items = match value.take() {
                Value::Array(items) => items,
                other => vec![other],
            };
            *value = aggregate.call(items).await.map_err(|e| {
                AutoloadError::Other(e.context(format!("aggregate for group '{name}' failed")))
            })?;
        }

        Ok(result)
    }

    /// Items shaped like a resolved file get their public uri before any
    /// transform sees them.
    fn rewrite_uri(&self, mut item: Value, prefix: Option<&str>, production: bool) -> Value {
        if !is_file_shaped(&item) {
            return item;
        }
        if let Some(uri) = item.get("uri").and_then(Value::as_str) {
            let public = self.uris.transform(uri, prefix, production);
            item["uri"] = Value::String(public);
        }
        item
    }
}

/// Whether `item` carries `uri`, `path` and `file`.
pub fn is_file_shaped(item: &Value) -> bool {
    item.as_object().is_some_and(|obj| {
        ["uri", "path", "file"]
            .iter()
            .all(|key| obj.contains_key(*key))
    })
}

/// Apply the error policy to the tagged per-item outcomes of one group.
fn settle(
    group: &str,
    outcomes: Vec<anyhow::Result<Value>>,
    policy: TransformErrorPolicy,
) -> Result<Vec<Value>> {
    let mut items = Vec::with_capacity(outcomes.len());
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match (outcome, policy) {
            (Ok(item), _) => items.push(item),
            (Err(e), TransformErrorPolicy::FailFast) => {
                return Err(AutoloadError::TransformError {
                    group: group.to_string(),
                    index,
                    message: format!("{e:#}"),
                });
            }
            (Err(e), TransformErrorPolicy::SkipAndLog) => {
                warn!(group = %group, index, error = %format!("{e:#}"), "transform failed; item skipped");
            }
        }
    }
    Ok(items)
}
