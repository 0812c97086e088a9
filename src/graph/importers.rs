// src/graph/importers.rs

//! Which consumer modules import which synthetic modules.
//!
//! Edges run importer -> imported module. Entries are only ever added during
//! a session; a stale edge costs an extra invalidation, never a missed one.

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};

#[derive(Debug, Default)]
pub struct ImporterGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl ImporterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, id: &str) -> NodeIndex {
        if let Some(idx) = self.nodes.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.nodes.insert(id.to_string(), idx);
        idx
    }

    /// Record that `importer` imports each of `modules`.
    pub fn record_dependency<S: AsRef<str>>(&mut self, importer: &str, modules: &[S]) {
        let from = self.node(importer);
        for module in modules {
            let to = self.node(module.as_ref());
            if self.graph.find_edge(from, to).is_none() {
                self.graph.add_edge(from, to, ());
            }
        }
    }

    /// Direct importers of `module`.
    pub fn importers_of(&self, module: &str) -> BTreeSet<String> {
        self.neighbors(module, Direction::Incoming)
    }

    /// Modules imported by `importer`.
    pub fn modules_of(&self, importer: &str) -> BTreeSet<String> {
        self.neighbors(importer, Direction::Outgoing)
    }

    /// Everything that imports any of `modules`, directly or through other
    /// importers. The modules themselves are not included.
    pub fn affected_importers<I, S>(&self, modules: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let reversed = Reversed(&self.graph);
        let mut affected = BTreeSet::new();
        for module in modules {
            let Some(&start) = self.nodes.get(module.as_ref()) else {
                continue;
            };
            let mut bfs = Bfs::new(reversed, start);
            while let Some(idx) = bfs.next(reversed) {
                if idx != start {
                    affected.insert(self.graph[idx].clone());
                }
            }
        }
        affected
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.nodes.clear();
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn neighbors(&self, id: &str, dir: Direction) -> BTreeSet<String> {
        let Some(&idx) = self.nodes.get(id) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].clone())
            .collect()
    }
}
