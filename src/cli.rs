// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};
use serde::Deserialize;

/// Command-line arguments for `autoload`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "autoload",
    version,
    about = "Generate virtual modules from files on disk and keep them in sync.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Autoload.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Autoload.toml")]
    pub config: String,

    /// Run a one-shot production build instead of a dev session.
    #[arg(long)]
    pub build: bool,

    /// Override the build output directory from `[settings.build]`.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `settings.log_level`, `AUTOLOAD_LOG` or a default level
    /// will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print components and resolved files, write nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI and in `[settings]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
