// src/lib.rs

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod generator;
pub mod graph;
pub mod host;
pub mod logging;
pub mod pipeline;
pub mod resolve;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{CoreEngine, EngineEvent, Orchestrator, Runtime};
use crate::fs::{FileSystem, RealFileSystem};
use crate::host::{AutoloadPlugin, FsHost, LoggingReloadSink};
use crate::types::BuildContext;
use crate::watch::path_utils::resolve_against;
use crate::watch::{WatchOptions, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and logging
/// - the orchestrator and its generators
/// - either a one-shot production build, or the watcher + runtime loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    logging::init_logging(args.log_level, cfg.settings.log_level)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if args.dry_run {
        return print_dry_run(cfg, fs).await;
    }

    if args.build {
        let out_dir = args
            .out_dir
            .clone()
            .unwrap_or_else(|| cfg.settings.build.out_dir.clone());
        let out_dir = resolve_against(&cfg.settings.root_dir, Path::new(&out_dir));
        return run_build(cfg, fs, out_dir).await;
    }

    run_dev(cfg, fs).await
}

/// One-shot production build into `out_dir`.
async fn run_build(cfg: ConfigFile, fs: Arc<dyn FileSystem>, out_dir: PathBuf) -> Result<()> {
    let root = cfg.settings.root_dir.clone();
    let orchestrator = Orchestrator::new(cfg, Arc::clone(&fs), Arc::new(LoggingReloadSink)).await?;
    let plugin = AutoloadPlugin::new(orchestrator);
    let host = FsHost::new(&out_dir, Arc::clone(&fs));

    let summary = plugin.build_start(&host).await?;
    plugin.close_bundle(&host).await?;

    let index = root.join("index.html");
    if fs.is_file(&index) {
        let html = fs.read_to_string(&index)?;
        let html = plugin.transform_index_html(&html).await;
        artifacts::write_if_changed(fs.as_ref(), &out_dir.join("index.html"), &html)?;
    }

    info!(
        out_dir = ?out_dir,
        chunks = summary.chunks,
        modules = summary.modules,
        "build finished"
    );
    Ok(())
}

/// Dev session: initial pass, then watch until Ctrl-C.
async fn run_dev(cfg: ConfigFile, fs: Arc<dyn FileSystem>) -> Result<()> {
    let watch = cfg.settings.watch.clone();
    let types_path = cfg.settings.types_path();

    let mut orchestrator = Orchestrator::new(cfg, fs, Arc::new(LoggingReloadSink)).await?;
    orchestrator.init().await?;
    let roots = orchestrator.watch_directories();

    let plugin = AutoloadPlugin::new(orchestrator);
    let core = CoreEngine::new(
        Duration::from_millis(watch.debounce_ms),
        watch.burst_behaviour,
        watch.queue_length,
    );
    let runtime = Runtime::new(core, plugin.clone());

    let _watcher_handle = spawn_watcher(
        WatchOptions {
            roots,
            ignore_files: types_path.into_iter().collect(),
            stability_threshold: Duration::from_millis(watch.stability_threshold_ms),
        },
        runtime.sender(),
    )?;

    // Ctrl-C -> graceful shutdown.
    {
        let tx = runtime.sender();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(EngineEvent::ShutdownRequested).await;
        });
    }

    runtime.run().await?;
    plugin.orchestrator().lock().await.dispose();
    Ok(())
}

/// Print components, groups and resolved files; write nothing.
async fn print_dry_run(cfg: ConfigFile, fs: Arc<dyn FileSystem>) -> Result<()> {
    println!("autoload dry-run");
    println!("  settings.root_dir = {}", cfg.settings.root_dir.display());
    println!("  settings.watch.debounce_ms = {}", cfg.settings.watch.debounce_ms);
    println!(
        "  settings.watch.burst_behaviour = {:?}",
        cfg.settings.watch.burst_behaviour
    );
    if let Some(types) = cfg.settings.types_path() {
        println!("  settings.export.types = {}", types.display());
    }
    println!();

    let orchestrator = Orchestrator::new(cfg, fs, Arc::new(LoggingReloadSink)).await?;
    let ctx = BuildContext::dev();

    println!("components ({}):", orchestrator.generators().len());
    for generator in orchestrator.generators() {
        println!("  - {}", generator.name());
        for group in &generator.config().groups {
            println!("      group: {}", group.name);
        }
        for file in generator.groups(&ctx) {
            println!("      file: {} -> {}", file.path, file.uri);
        }
    }

    debug!("dry-run complete (nothing written)");
    Ok(())
}
