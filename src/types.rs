// src/types.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which session the generator is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Build,
}

/// Context passed to `data` / `code` requests.
///
/// `name` narrows the result to a single group (or the whole component when
/// it names the component itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct BuildContext {
    pub production: bool,
    pub environment: Environment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl BuildContext {
    pub fn dev() -> Self {
        Self {
            production: false,
            environment: Environment::Dev,
            name: None,
        }
    }

    pub fn production() -> Self {
        Self {
            production: true,
            environment: Environment::Build,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// What happens to a burst of changes that settles while a cycle is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BurstBehaviour {
    /// Fold every pending burst into the single next cycle.
    #[default]
    Merge,
    /// Keep pending bursts as separate FIFO cycles (bounded by queue length).
    Queue,
}

/// How a failing per-item transform affects the rest of the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TransformErrorPolicy {
    #[default]
    FailFast,
    SkipAndLog,
}

/// Metadata attached to an item.
///
/// A deferred import is kept as data and turned into a lazy loader only when
/// module source is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metadata {
    Literal { value: Value },
    DeferredImport {
        module_path: String,
        export_name: String,
    },
}

impl Metadata {
    pub fn deferred(module_path: impl Into<String>, export_name: impl Into<String>) -> Self {
        Metadata::DeferredImport {
            module_path: module_path.into(),
            export_name: export_name.into(),
        }
    }

    /// Recognise a serialized metadata value inside arbitrary item data.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let kind = obj.get("kind")?.as_str()?;
        let expected_len = match kind {
            "literal" => 2,
            "deferred_import" => 3,
            _ => return None,
        };
        if obj.len() != expected_len {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Dev => f.write_str("dev"),
            Environment::Build => f.write_str("build"),
        }
    }
}
