// src/generator/mod.rs

pub mod codegen;
pub mod collection;
pub mod name_index;

pub use codegen::{ContentGenerator, TemplateGenerator};
pub use collection::CollectionGenerator;
pub use name_index::{NameIndex, NameIndexEntry, NameKind, VIRTUAL_PREFIX, virtual_id};
