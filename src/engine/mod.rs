// src/engine/mod.rs

//! Change-cycle engine.
//!
//! Filesystem events are debounced into bursts; each settled burst becomes
//! one change cycle run by the [`orchestrator::Orchestrator`]. At most one
//! cycle runs at a time.
//!
//! The pure state machine lives in [`core`]; the async shell with timers
//! and the spawned cycle task is implemented in [`runtime`].

use std::path::PathBuf;
use std::time::Duration;

/// Events flowing into the engine from the watcher, timers and cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The watcher saw changes under a watched directory.
    PathsChanged(Vec<PathBuf>),
    /// A debounce timer fired. Only the timer of the latest generation counts.
    DebounceElapsed { generation: u64 },
    /// The running change cycle finished (successfully or not).
    CycleCompleted,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Observable engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Debouncing,
    Processing,
}

/// What the shell should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start a timer that sends `DebounceElapsed { generation }` after `delay`.
    ArmDebounce { generation: u64, delay: Duration },
    /// Run one change cycle over these paths.
    RunCycle(Vec<PathBuf>),
}

/// Result of feeding one event into the core.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}

pub mod core;
pub mod orchestrator;
pub mod queue;
pub mod runtime;

pub use self::core::CoreEngine;
pub use orchestrator::{CycleReport, Orchestrator};
pub use queue::BurstQueue;
pub use runtime::Runtime;
