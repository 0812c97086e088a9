// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutoloadError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Duplicate names: {}", format_conflicts(.0))]
    DuplicateName(Vec<NameConflict>),

    #[error("Failed to resolve group '{group}': {message}")]
    ResolutionError { group: String, message: String },

    #[error("Transform failed for item {index} of group '{group}': {message}")]
    TransformError {
        group: String,
        index: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Every declaration of a name that appears more than once in the namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConflict {
    pub name: String,
    pub owners: Vec<NameOwner>,
}

/// One place where a name was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameOwner {
    Component(String),
    Group { component: String },
}

impl fmt::Display for NameOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameOwner::Component(name) => write!(f, "component \"{name}\""),
            NameOwner::Group { component } => {
                write!(f, "a group of component \"{component}\"")
            }
        }
    }
}

impl fmt::Display for NameConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owners: Vec<String> = self.owners.iter().map(|o| o.to_string()).collect();
        write!(
            f,
            "\"{}\" is declared by {}",
            self.name,
            owners.join(" and by ")
        )
    }
}

fn format_conflicts(conflicts: &[NameConflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AutoloadError>;
