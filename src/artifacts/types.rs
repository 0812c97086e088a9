// src/artifacts/types.rs

//! Type declarations built from a component's `types` strategy.

use serde_json::Value;
use tracing::warn;

use crate::config::TypesStrategy;
use crate::pipeline::GroupData;

/// One `export type` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub name: String,
    pub values: Vec<String>,
}

/// Collect the distinct string values of `strategy.property` across every
/// group of a component, in first-seen order.
pub fn collect_type_values(
    component: &str,
    strategy: &TypesStrategy,
    data: &GroupData,
) -> TypeDeclaration {
    let mut values: Vec<String> = Vec::new();
    for (group, value) in data {
        let items: &[Value] = match value {
            Value::Array(items) => items,
            other => std::slice::from_ref(other),
        };
        for item in items {
            match item.get(&strategy.property) {
                Some(Value::String(s)) => {
                    if !values.contains(s) {
                        values.push(s.clone());
                    }
                }
                Some(other) => warn!(
                    component = %component,
                    group = %group,
                    property = %strategy.property,
                    value = %other,
                    "type property is not a string; skipping"
                ),
                None => {}
            }
        }
    }
    TypeDeclaration {
        name: strategy.name.clone(),
        values,
    }
}

/// `export type Name = 'a' | 'b';` per declaration, separated by blank lines.
pub fn render_type_declarations(decls: &[TypeDeclaration]) -> String {
    let mut blocks = Vec::with_capacity(decls.len());
    for decl in decls {
        let union = if decl.values.is_empty() {
            "never".to_string()
        } else {
            decl.values
                .iter()
                .map(|v| format!("'{}'", escape_single(v)))
                .collect::<Vec<_>>()
                .join(" | ")
        };
        blocks.push(format!("export type {} = {};", decl.name, union));
    }
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

fn escape_single(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
