// src/config/mod.rs

pub mod components;
pub mod loader;
pub mod model;
pub mod validate;

pub use components::{
    ComponentConfig, FileMatchConfig, GroupConfig, GroupInput, OutputConfig, SitemapStrategy,
    Strategy, TypesStrategy,
};
pub use model::{ConfigFile, RawConfigFile, Settings};
