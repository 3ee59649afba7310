//! Coarse indexer lifecycle state, reported to the language client as
//! progress.

use std::time::Instant;

/// Current phase of a workspace scan.
#[derive(Clone, Debug)]
pub enum IndexState {
    /// No directories have been queued yet.
    Idle,
    /// A scan is in progress.
    Building {
        /// Units completed (files parsed, successfully or not).
        done: u64,
        /// Units currently being processed by a worker.
        in_progress: u64,
        /// Units still queued, counting directories at `dir_cost` each.
        queued: u64,
    },
    /// The worklist drained with no directory enumeration errors.
    Ready {
        /// Total files parsed across the whole run.
        file_count: u64,
        /// When the run finished.
        completed_at: Instant,
    },
    /// The worklist drained but at least one directory could not be read.
    Degraded {
        /// Number of directory enumeration failures encountered.
        errors: u64,
    },
}

impl IndexState {
    /// Fraction of work completed, in `[0.0, 1.0]`. Monotonic within a single
    /// run: `done` only grows and `in_progress`/`queued`
    /// only shrink as units are claimed.
    pub fn progress(&self) -> f64 {
        match self {
            IndexState::Idle => 0.0,
            IndexState::Ready { .. } => 1.0,
            IndexState::Degraded { .. } => 1.0,
            IndexState::Building { done, in_progress, queued } => {
                let denom = (*done + *in_progress + *queued) as f64;
                if denom == 0.0 {
                    1.0
                } else {
                    *done as f64 / denom
                }
            }
        }
    }

    /// Whether a full query path may rely on `valid_env` being complete.
    pub fn is_ready(&self) -> bool {
        matches!(self, IndexState::Ready { .. })
    }
}
