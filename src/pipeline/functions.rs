// src/pipeline/functions.rs

//! Shared handles for user-supplied functions.
//!
//! Each handle wraps an `Arc`'d closure returning a boxed future, so sync and
//! async functions are driven the same way by the processor.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::pipeline::GroupData;
use crate::types::Environment;

/// What a transform sees besides its item.
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Output of the groups transformed earlier in this pass.
    pub data: Arc<GroupData>,
    pub production: bool,
    pub environment: Environment,
    /// Name of the group the item belongs to.
    pub group: String,
}

type TransformInner = dyn Fn(Value, TransformContext) -> BoxFuture<'static, Result<Value>> + Send + Sync;
type AggregateInner = dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync;
type ProducerInner = dyn Fn() -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// Per-item transform.
#[derive(Clone)]
pub struct TransformFn(Arc<TransformInner>);

impl TransformFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &TransformContext) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(move |item, ctx| {
            let out = f(item, &ctx);
            futures::future::ready(out).boxed()
        }))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, TransformContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self(Arc::new(move |item, ctx| f(item, ctx).boxed()))
    }

    /// Run several transforms one after another.
    pub fn chain(steps: Vec<TransformFn>) -> Self {
        let steps = Arc::new(steps);
        Self(Arc::new(move |item, ctx| {
            let steps = Arc::clone(&steps);
            async move {
                let mut item = item;
                for step in steps.iter() {
                    item = step.call(item, ctx.clone()).await?;
                }
                Ok(item)
            }
            .boxed()
        }))
    }

    pub fn call(&self, item: Value, ctx: TransformContext) -> BoxFuture<'static, Result<Value>> {
        (self.0)(item, ctx)
    }
}

/// Whole-group aggregate, run after every group is transformed.
#[derive(Clone)]
pub struct AggregateFn(Arc<AggregateInner>);

impl AggregateFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(move |items| futures::future::ready(f(items)).boxed()))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self(Arc::new(move |items| f(items).boxed()))
    }

    pub fn call(&self, items: Vec<Value>) -> BoxFuture<'static, Result<Value>> {
        (self.0)(items)
    }
}

/// Zero-argument producer backing a data-source group.
#[derive(Clone)]
pub struct DataSourceFn(Arc<ProducerInner>);

impl DataSourceFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(move || futures::future::ready(f()).boxed()))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self(Arc::new(move || f().boxed()))
    }

    /// A producer that always yields the same value.
    pub fn constant(value: Value) -> Self {
        Self::new(move || Ok(value.clone()))
    }

    pub fn call(&self) -> BoxFuture<'static, Result<Value>> {
        (self.0)()
    }
}

impl fmt::Debug for TransformFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransformFn(..)")
    }
}

impl fmt::Debug for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AggregateFn(..)")
    }
}

impl fmt::Debug for DataSourceFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataSourceFn(..)")
    }
}
