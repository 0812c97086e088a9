// src/generator/codegen.rs

//! Module source rendering.
//!
//! Each group becomes one named export rendered from a template; the module
//! ends with a default export of all groups.

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Write};

use serde_json::Value;

use crate::config::ComponentConfig;
use crate::errors::Result;
use crate::pipeline::GroupData;
use crate::types::{BuildContext, Metadata};

pub const DEFAULT_TEMPLATE: &str = "export const {key} = {{ data }};";

const INDENT: &str = "    ";

/// Turns processed data into module source text.
pub trait ContentGenerator: Send + Sync + Debug {
    fn generate(&self, data: &GroupData, ctx: &BuildContext) -> Result<String>;
}

/// Template-driven generator; groups without a template use
/// [`DEFAULT_TEMPLATE`].
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator {
    templates: HashMap<String, String>,
}

impl TemplateGenerator {
    pub fn from_component(component: &ComponentConfig) -> Self {
        let templates = component
            .groups
            .iter()
            .filter_map(|g| g.output.template.clone().map(|t| (g.name.clone(), t)))
            .collect();
        Self { templates }
    }
}

impl ContentGenerator for TemplateGenerator {
    fn generate(&self, data: &GroupData, _ctx: &BuildContext) -> Result<String> {
        let mut out = String::new();
        let mut exports: Vec<(&str, String)> = Vec::with_capacity(data.len());
        let mut taken = HashSet::new();

        for (key, value) in data {
            let ident = unique_ident(export_ident(key), &mut taken);
            let template = self
                .templates
                .get(key)
                .map(String::as_str)
                .unwrap_or(DEFAULT_TEMPLATE);
            let rendered = template
                .replace("{key}", &ident)
                .replace("{{ data }}", &render_literal(value));
            out.push_str(&rendered);
            out.push_str("\n\n");
            exports.push((key.as_str(), ident));
        }

        match exports.as_slice() {
            [] => out.push_str("export default {};\n"),
            [(_, ident)] => {
                let _ = writeln!(out, "export default {ident};");
            }
            many => {
                out.push_str("export default {\n");
                for (key, ident) in many {
                    if *key == ident.as_str() {
                        let _ = writeln!(out, "  {ident},");
                    } else {
                        let _ = writeln!(out, "  {}: {ident},", quote(key));
                    }
                }
                out.push_str("};\n");
            }
        }
        Ok(out)
    }
}

const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue",
    "debugger", "default", "delete", "do", "else", "enum", "eval", "export", "extends",
    "false", "finally", "for", "function", "if", "implements", "import", "in",
    "instanceof", "interface", "let", "new", "null", "package", "private", "protected",
    "public", "return", "static", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "yield",
];

/// A JavaScript identifier for a group name. Reserved words get a leading
/// underscore.
pub fn export_ident(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if ident.is_empty()
        || ident.starts_with(|c: char| c.is_ascii_digit())
        || RESERVED_WORDS.contains(&ident.as_str())
    {
        ident.insert(0, '_');
    }
    ident
}

// Group names that sanitize to the same identifier get numbered suffixes.
fn unique_ident(base: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Render a value as a JavaScript expression, pretty-printed with four
/// spaces. Deferred-import metadata becomes a lazy loader.
///
/// Nesting depth is bounded only by memory; the walk keeps its own stack.
pub fn render_literal(value: &Value) -> String {
    let mut out = String::new();
    let mut stack = vec![Step::Value(value, 0)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Text(text) => out.push_str(&text),
            Step::Close(bracket, depth) => {
                push_indent(&mut out, depth);
                out.push(bracket);
            }
            Step::Value(value, depth) => write_value(&mut out, &mut stack, value, depth),
        }
    }
    out
}

enum Step<'a> {
    Value(&'a Value, usize),
    Text(String),
    Close(char, usize),
}

// Writes scalars directly; containers push their items (in reverse) so
// they are rendered by the caller's loop.
fn write_value<'a>(out: &mut String, stack: &mut Vec<Step<'a>>, value: &'a Value, depth: usize) {
    let mut value = value;
    while let Some(inner) = literal_inner(value) {
        value = inner;
    }

    if let Some(Metadata::DeferredImport {
        module_path,
        export_name,
    }) = Metadata::from_value(value)
    {
        let _ = write!(
            out,
            "() => import({}).then((m) => m[{}])",
            quote(&module_path),
            quote(&export_name)
        );
        return;
    }

    match value {
        Value::Array(items) if !items.is_empty() => {
            out.push_str("[\n");
            stack.push(Step::Close(']', depth));
            for (i, item) in items.iter().enumerate().rev() {
                stack.push(Step::Text(separator(i, items.len())));
                stack.push(Step::Value(item, depth + 1));
                stack.push(Step::Text(INDENT.repeat(depth + 1)));
            }
        }
        Value::Object(map) if !map.is_empty() => {
            out.push_str("{\n");
            stack.push(Step::Close('}', depth));
            for (i, (key, item)) in map.iter().enumerate().rev() {
                stack.push(Step::Text(separator(i, map.len())));
                stack.push(Step::Value(item, depth + 1));
                stack.push(Step::Text(format!("{}{}: ", INDENT.repeat(depth + 1), quote(key))));
            }
        }
        Value::Array(_) => out.push_str("[]"),
        Value::Object(_) => out.push_str("{}"),
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn literal_inner(value: &Value) -> Option<&Value> {
    let map = value.as_object()?;
    if map.len() == 2 && map.get("kind").and_then(Value::as_str) == Some("literal") {
        map.get("value")
    } else {
        None
    }
}

fn separator(index: usize, len: usize) -> String {
    if index + 1 < len { ",\n".to_string() } else { "\n".to_string() }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}
