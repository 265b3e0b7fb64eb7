// src/engine/state.rs

use std::collections::BTreeMap;

use crate::engine::Outcome;
use crate::types::HostId;

/// Bookkeeping for one run: which hosts are still outstanding and which
/// outcomes have been collected.
///
/// Only the dispatch loop mutates this. It has no channels and does no IO.
#[derive(Debug, Default)]
pub struct RunState {
    /// Outstanding tasks per host id. A count rather than a set so duplicate
    /// ids in a hand-built host list are not collapsed.
    pending: BTreeMap<HostId, usize>,
    completed: Vec<Outcome>,
    heartbeats: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dispatched task.
    pub fn mark_pending(&mut self, host: &str) {
        *self.pending.entry(host.to_string()).or_insert(0) += 1;
    }

    /// Record a terminal outcome, clearing its pending entry if it had one.
    pub fn record(&mut self, outcome: Outcome) {
        if let Some(count) = self.pending.get_mut(&outcome.host) {
            *count -= 1;
            if *count == 0 {
                self.pending.remove(&outcome.host);
            }
        }
        self.completed.push(outcome);
    }

    pub fn note_heartbeat(&mut self) {
        self.heartbeats += 1;
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().sum()
    }

    /// Host ids still outstanding, sorted.
    pub fn pending_hosts(&self) -> Vec<&str> {
        self.pending.keys().map(String::as_str).collect()
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn heartbeats(&self) -> usize {
        self.heartbeats
    }

    pub fn completed(&self) -> &[Outcome] {
        &self.completed
    }

    /// Outcomes in the order they were recorded.
    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.completed
    }
}
