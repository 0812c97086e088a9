// src/artifacts/mod.rs

//! Derived artifacts: type declarations, sitemap and web manifest.

pub mod manifest;
pub mod sitemap;
pub mod types;
pub mod writer;

pub use writer::write_if_changed;
