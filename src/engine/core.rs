// src/engine/core.rs

//! Pure change-cycle state machine.
//!
//! `Idle -> Debouncing -> Processing -> Idle`. The core consumes
//! [`EngineEvent`]s and returns [`CoreCommand`]s for the async shell. It owns
//! no timers, channels or files, so every transition can be tested
//! synchronously.
//!
//! - Every `PathsChanged` bumps the debounce generation and asks for a new
//!   timer; only the timer of the latest generation settles the burst.
//! - A settled burst starts a cycle unless one is running, in which case it
//!   is handed to the [`BurstQueue`] and started when the cycle completes.
//! - Shutdown waits for a running cycle to finish.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::engine::queue::BurstQueue;
use crate::engine::{CoreCommand, CoreStep, EngineEvent, EngineState};
use crate::types::BurstBehaviour;

#[derive(Debug)]
pub struct CoreEngine {
    debounce: Duration,
    generation: u64,
    burst: BTreeSet<PathBuf>,
    pending: BurstQueue,
    processing: bool,
    shutdown_pending: bool,
}

impl CoreEngine {
    pub fn new(debounce: Duration, behaviour: BurstBehaviour, queue_length: usize) -> Self {
        Self {
            debounce,
            generation: 0,
            burst: BTreeSet::new(),
            pending: BurstQueue::new(behaviour, queue_length),
            processing: false,
            shutdown_pending: false,
        }
    }

    pub fn state(&self) -> EngineState {
        if self.processing {
            EngineState::Processing
        } else if !self.burst.is_empty() {
            EngineState::Debouncing
        } else {
            EngineState::Idle
        }
    }

    /// Paths collected for the burst that has not settled yet.
    pub fn collecting(&self) -> usize {
        self.burst.len()
    }

    /// Number of settled bursts waiting for the running cycle.
    pub fn pending_batches(&self) -> usize {
        self.pending.len()
    }

    pub fn step(&mut self, event: EngineEvent) -> CoreStep {
        match event {
            EngineEvent::PathsChanged(paths) => self.on_paths_changed(paths),
            EngineEvent::DebounceElapsed { generation } => self.on_debounce_elapsed(generation),
            EngineEvent::CycleCompleted => self.on_cycle_completed(),
            EngineEvent::ShutdownRequested => self.on_shutdown(),
        }
    }

    fn on_paths_changed(&mut self, paths: Vec<PathBuf>) -> CoreStep {
        if paths.is_empty() || self.shutdown_pending {
            return running(Vec::new());
        }
        self.burst.extend(paths);
        self.generation += 1;
        debug!(generation = self.generation, paths = self.burst.len(), "debouncing burst");
        running(vec![CoreCommand::ArmDebounce {
            generation: self.generation,
            delay: self.debounce,
        }])
    }

    fn on_debounce_elapsed(&mut self, generation: u64) -> CoreStep {
        if generation != self.generation || self.burst.is_empty() {
            return running(Vec::new());
        }
        let burst = std::mem::take(&mut self.burst);

        if self.processing {
            debug!(paths = burst.len(), "burst settled during a cycle; deferring");
            self.pending.record(burst);
            return running(Vec::new());
        }

        self.processing = true;
        running(vec![CoreCommand::RunCycle(burst.into_iter().collect())])
    }

    fn on_cycle_completed(&mut self) -> CoreStep {
        self.processing = false;

        if self.shutdown_pending {
            return CoreStep {
                commands: Vec::new(),
                keep_running: false,
            };
        }

        match self.pending.pop_next() {
            Some(batch) => {
                self.processing = true;
                running(vec![CoreCommand::RunCycle(batch)])
            }
            None => running(Vec::new()),
        }
    }

    fn on_shutdown(&mut self) -> CoreStep {
        if self.processing {
            debug!("shutdown requested during a cycle; waiting for it to finish");
            self.shutdown_pending = true;
            return running(Vec::new());
        }
        CoreStep {
            commands: Vec::new(),
            keep_running: false,
        }
    }
}

fn running(commands: Vec<CoreCommand>) -> CoreStep {
    CoreStep {
        commands,
        keep_running: true,
    }
}
