// src/pipeline/mod.rs

pub mod builtins;
pub mod functions;
pub mod processor;

/// Processed output of a component: group name -> transformed/aggregated
/// value, in declaration order.
pub type GroupData = serde_json::Map<String, serde_json::Value>;

pub use functions::{AggregateFn, DataSourceFn, TransformContext, TransformFn};
pub use processor::DataProcessor;
