// src/resolve/mod.rs

//! Resolution of group inputs: files on disk and data-source producers.

pub mod data;
pub mod files;
pub mod patterns;
pub mod uri;

pub use data::DataSourceResolver;
pub use files::{FileResolver, GroupEntries, ResolvedFile};
pub use patterns::MatchRule;
pub use uri::{UriTransformer, transform_uri};
