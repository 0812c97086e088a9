// src/engine/runtime.rs

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::{CoreCommand, CoreEngine, EngineEvent};
use crate::host::AutoloadPlugin;

/// Capacity of the engine event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Async shell around [`CoreEngine`].
///
/// Responsibilities:
/// - Consume `EngineEvent`s from the watcher, timers, cycle tasks and Ctrl-C.
/// - Arm debounce timers requested by the core.
/// - Run change cycles on a spawned task and report their completion.
pub struct Runtime {
    core: CoreEngine,
    plugin: AutoloadPlugin,
    events_tx: mpsc::Sender<EngineEvent>,
    events_rx: mpsc::Receiver<EngineEvent>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(core: CoreEngine, plugin: AutoloadPlugin) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            core,
            plugin,
            events_tx,
            events_rx,
        }
    }

    /// Sender for producers (watcher, signal handler).
    pub fn sender(&self) -> mpsc::Sender<EngineEvent> {
        self.events_tx.clone()
    }

    /// Main event loop. Returns once shutdown was requested and no cycle is
    /// running.
    pub async fn run(mut self) -> Result<()> {
        info!("autoload runtime started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute(command);
            }

            if !step.keep_running {
                break;
            }
        }

        info!("autoload runtime exiting");
        Ok(())
    }

    fn execute(&self, command: CoreCommand) {
        match command {
            CoreCommand::ArmDebounce { generation, delay } => {
                self.arm_debounce(generation, delay)
            }
            CoreCommand::RunCycle(paths) => self.spawn_cycle(paths),
        }
    }

    fn arm_debounce(&self, generation: u64, delay: Duration) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // A closed channel means the runtime already exited.
            let _ = tx.send(EngineEvent::DebounceElapsed { generation }).await;
        });
    }

    fn spawn_cycle(&self, paths: Vec<PathBuf>) {
        let tx = self.events_tx.clone();
        let plugin = self.plugin.clone();
        info!(paths = paths.len(), "starting change cycle");
        tokio::spawn(async move {
            // The engine stays busy until CycleCompleted arrives, so it is
            // sent even when a user callback panics.
            match AssertUnwindSafe(plugin.on_files_changed(&paths))
                .catch_unwind()
                .await
            {
                Ok(report) if report.failed.is_empty() => info!(
                    changed = report.changed.len(),
                    invalidated = report.invalidated.len(),
                    "change cycle finished"
                ),
                Ok(report) => warn!(failed = ?report.failed, "change cycle finished with errors"),
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_default();
                    error!(panic = %message, "change cycle panicked");
                }
            }
            if let Err(err) = tx.send(EngineEvent::CycleCompleted).await {
                warn!("failed to send EngineEvent::CycleCompleted: {err}");
            }
        });
    }
}
