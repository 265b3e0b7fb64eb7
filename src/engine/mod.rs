// src/engine/mod.rs

//! Orchestration engine for fleetrun.
//!
//! This module ties together:
//! - the per-host [`Task`]s and their bounded worker pool
//! - the [`RunState`] bookkeeping (pending hosts, collected outcomes)
//! - the dispatch loop in [`runtime`] that waits for completions and emits
//!   heartbeats while hosts are still outstanding
//!
//! Host failures never escape a task: every task ends in an [`Outcome`].

use std::time::Duration;

use serde::Serialize;

use crate::types::HostId;

/// Terminal message of an outcome with nothing worth reporting.
pub const DONE: &str = "done";

/// Terminal status of one host in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
    /// Never dispatched (no address).
    Skipped,
}

/// Result of one host's task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub host: HostId,
    pub status: OutcomeStatus,
    /// Diagnostic lines collected from every step, in order.
    pub notable: Vec<String>,
    pub message: String,
}

impl Outcome {
    /// Successful outcome. The message is [`DONE`] unless notable lines were
    /// collected along the way.
    pub fn succeeded(host: impl Into<HostId>, notable: Vec<String>) -> Self {
        let message = if notable.is_empty() {
            DONE.to_string()
        } else {
            format!("finished with {} notable line(s)", notable.len())
        };
        Self {
            host: host.into(),
            status: OutcomeStatus::Succeeded,
            notable,
            message,
        }
    }

    /// Successful outcome with a message worth showing in the summary.
    pub fn succeeded_with(
        host: impl Into<HostId>,
        message: impl Into<String>,
        notable: Vec<String>,
    ) -> Self {
        Self {
            host: host.into(),
            status: OutcomeStatus::Succeeded,
            notable,
            message: message.into(),
        }
    }

    pub fn failed(
        host: impl Into<HostId>,
        message: impl Into<String>,
        notable: Vec<String>,
    ) -> Self {
        Self {
            host: host.into(),
            status: OutcomeStatus::Failed,
            notable,
            message: message.into(),
        }
    }

    pub fn skipped(host: impl Into<HostId>) -> Self {
        Self {
            host: host.into(),
            status: OutcomeStatus::Skipped,
            notable: Vec::new(),
            message: "skipped: no host address configured".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }

    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == OutcomeStatus::Skipped
    }
}

/// Lifecycle of a dispatched task. `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// Knobs for one engine run.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Maximum number of hosts in the `Running` state at once.
    pub max_concurrency: usize,
    /// How long to wait for a completion before emitting a heartbeat.
    pub heartbeat_interval: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            heartbeat_interval: Duration::from_secs(10),
        }
    }
}

/// Progress notifications published while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A host was excluded before dispatch.
    Skipped { host: HostId },
    /// A task changed state.
    Transition { host: HostId, state: TaskState },
    /// No task completed within one heartbeat interval.
    Heartbeat { pending: usize, elapsed: Duration },
}

pub mod runtime;
pub mod state;
pub mod task;

pub use runtime::Engine;
pub use state::RunState;
pub use task::Task;
