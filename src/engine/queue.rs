// src/engine/queue.rs

use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::types::BurstBehaviour;

/// Bursts that settled while a change cycle was running.
///
/// - `Merge`: every pending burst is folded into one batch, so the next
///   cycle sees the union of all paths.
/// - `Queue`: each burst is its own batch, run in FIFO order. When more than
///   `max_batches` are pending the two oldest are merged; paths are never
///   dropped.
#[derive(Debug)]
pub struct BurstQueue {
    behaviour: BurstBehaviour,
    max_batches: usize,
    batches: VecDeque<BTreeSet<PathBuf>>,
}

impl BurstQueue {
    /// `max_batches` is clamped to at least 1.
    pub fn new(behaviour: BurstBehaviour, max_batches: usize) -> Self {
        Self {
            behaviour,
            max_batches: max_batches.max(1),
            batches: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn record(&mut self, burst: BTreeSet<PathBuf>) {
        if burst.is_empty() {
            return;
        }
        match self.behaviour {
            BurstBehaviour::Merge => {
                if let Some(batch) = self.batches.back_mut() {
                    batch.extend(burst);
                    debug!(paths = batch.len(), "merged burst into pending batch");
                } else {
                    debug!(paths = burst.len(), "deferred burst until cycle completes");
                    self.batches.push_back(burst);
                }
            }
            BurstBehaviour::Queue => {
                self.batches.push_back(burst);
                while self.batches.len() > self.max_batches {
                    warn!(
                        pending = self.batches.len(),
                        max_batches = self.max_batches,
                        "too many pending bursts; merging the oldest two"
                    );
                    if let Some(oldest) = self.batches.pop_front() {
                        if let Some(next) = self.batches.front_mut() {
                            next.extend(oldest);
                        }
                    }
                }
            }
        }
    }

    /// Next batch to run, oldest first.
    pub fn pop_next(&mut self) -> Option<Vec<PathBuf>> {
        self.batches
            .pop_front()
            .map(|batch| batch.into_iter().collect())
    }
}
