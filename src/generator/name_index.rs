// src/generator/name_index.rs

//! Flat namespace of component and group names.
//!
//! Every component name and every group name must be globally unique; a
//! requested `virtual:<name>` resolves to exactly one owner.

use std::collections::HashMap;

use crate::config::ComponentConfig;
use crate::errors::{AutoloadError, NameConflict, NameOwner, Result};

/// Prefix of synthetic module ids as written by consumers.
pub const VIRTUAL_PREFIX: &str = "virtual:";

/// `virtual:<name>`.
pub fn virtual_id(name: &str) -> String {
    format!("{VIRTUAL_PREFIX}{name}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Component,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameIndexEntry {
    pub kind: NameKind,
    pub component: String,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    entries: HashMap<String, NameIndexEntry>,
    /// Names in declaration order.
    order: Vec<String>,
}

impl NameIndex {
    /// Build the index, failing with every collision found.
    pub fn new<'a, I>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a ComponentConfig>,
    {
        let mut index = NameIndex::default();
        let mut claims: HashMap<String, Vec<NameOwner>> = HashMap::new();
        let mut conflict_order: Vec<String> = Vec::new();

        let mut claim = |name: &str, owner: NameOwner, entry: NameIndexEntry, index: &mut NameIndex| {
            let owners = claims.entry(name.to_string()).or_default();
            owners.push(owner);
            if owners.len() == 1 {
                index.entries.insert(name.to_string(), entry);
                index.order.push(name.to_string());
            } else if owners.len() == 2 {
                conflict_order.push(name.to_string());
            }
        };

        for component in components {
            claim(
                &component.name,
                NameOwner::Component(component.name.clone()),
                NameIndexEntry {
                    kind: NameKind::Component,
                    component: component.name.clone(),
                    group: None,
                },
                &mut index,
            );
            for group in &component.groups {
                claim(
                    &group.name,
                    NameOwner::Group {
                        component: component.name.clone(),
                    },
                    NameIndexEntry {
                        kind: NameKind::Group,
                        component: component.name.clone(),
                        group: Some(group.name.clone()),
                    },
                    &mut index,
                );
            }
        }

        if conflict_order.is_empty() {
            return Ok(index);
        }

        let conflicts = conflict_order
            .into_iter()
            .map(|name| NameConflict {
                owners: claims.remove(&name).unwrap_or_default(),
                name,
            })
            .collect();
        Err(AutoloadError::DuplicateName(conflicts))
    }

    pub fn lookup(&self, name: &str) -> Option<&NameIndexEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolve a `virtual:<name>` id to its name and owner.
    pub fn resolve_virtual<'s>(&'s self, id: &'s str) -> Option<(&'s str, &'s NameIndexEntry)> {
        let name = id.strip_prefix(VIRTUAL_PREFIX)?;
        self.lookup(name).map(|entry| (name, entry))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn component_names(&self) -> Vec<&str> {
        self.names_of_kind(NameKind::Component)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.names_of_kind(NameKind::Group)
    }

    /// Group names owned by `component`.
    pub fn groups_of(&self, component: &str) -> Vec<&str> {
        self.order
            .iter()
            .filter(|n| {
                self.entries.get(n.as_str()).is_some_and(|e| {
                    e.kind == NameKind::Group && e.component == component
                })
            })
            .map(String::as_str)
            .collect()
    }

    /// The component's own name followed by its group names.
    pub fn names_for_component(&self, component: &str) -> Vec<&str> {
        self.order
            .iter()
            .filter(|n| {
                self.entries
                    .get(n.as_str())
                    .is_some_and(|e| e.component == component)
            })
            .map(String::as_str)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn names_of_kind(&self, kind: NameKind) -> Vec<&str> {
        self.order
            .iter()
            .filter(|n| self.entries.get(n.as_str()).is_some_and(|e| e.kind == kind))
            .map(String::as_str)
            .collect()
    }
}
