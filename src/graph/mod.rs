// src/graph/mod.rs

pub mod importers;
pub mod imports;
pub mod tracker;

pub use importers::ImporterGraph;
pub use imports::{is_javascript_like, parse_imports};
pub use tracker::{DependencyTracker, FileExportMap};
