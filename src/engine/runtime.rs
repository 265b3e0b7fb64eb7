// src/engine/runtime.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{Id, JoinSet};
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::engine::{EngineEvent, EngineOptions, Outcome, RunState, Task};
use crate::types::{Host, HostId};
use crate::workflow::HostWorkflow;

/// Fans one workflow out over a set of hosts.
///
/// Hosts run independently in a pool of at most `max_concurrency` slots.
/// A failing host never stops the others; the engine only aggregates.
pub struct Engine {
    options: EngineOptions,
    events: Option<mpsc::UnboundedSender<EngineEvent>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            events: None,
        }
    }

    /// Publish [`EngineEvent`]s to `tx` while running.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Run `workflow` on every host and return one outcome per host.
    ///
    /// - Hosts without an address are skipped up front and never take a
    ///   worker slot.
    /// - While tasks are outstanding the loop waits up to one heartbeat
    ///   interval for a completion; if none arrives a heartbeat is emitted.
    /// - Outcomes are returned in completion order (skipped hosts first).
    pub async fn run(&self, hosts: Vec<Host>, workflow: Arc<dyn HostWorkflow>) -> Vec<Outcome> {
        let started = Instant::now();
        let mut state = RunState::new();
        let permits = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut tasks: JoinSet<Outcome> = JoinSet::new();
        let mut owners: HashMap<Id, HostId> = HashMap::new();
        let mut skipped = 0usize;

        for host in hosts {
            if host.resolved_address().is_none() {
                warn!(host = %host.id, "skipping host without an address");
                self.emit(EngineEvent::Skipped {
                    host: host.id.clone(),
                });
                state.record(Outcome::skipped(host.id));
                skipped += 1;
                continue;
            }

            state.mark_pending(&host.id);
            let id = host.id.clone();
            let task = Task::new(host, Arc::clone(&workflow));
            let handle = tasks.spawn(task.run(Arc::clone(&permits), self.events.clone()));
            owners.insert(handle.id(), id);
        }

        info!(
            workflow = workflow.name(),
            dispatched = tasks.len(),
            skipped,
            max_concurrency = self.options.max_concurrency,
            "hosts dispatched"
        );

        while !tasks.is_empty() {
            match timeout(self.options.heartbeat_interval, tasks.join_next_with_id()).await {
                Ok(Some(Ok((task_id, outcome)))) => {
                    owners.remove(&task_id);
                    self.complete(&mut state, outcome);
                }
                Ok(Some(Err(join_err))) => {
                    let host = owners.remove(&join_err.id()).unwrap_or_default();
                    error!(host = %host, error = %join_err, "host task aborted");
                    let message = format!("task for {host} aborted: {join_err}");
                    self.complete(&mut state, Outcome::failed(host, message, Vec::new()));
                }
                Ok(None) => break,
                Err(_elapsed) => {
                    let pending = state.pending_count();
                    let elapsed = started.elapsed();
                    state.note_heartbeat();
                    info!(
                        pending,
                        elapsed_secs = elapsed.as_secs(),
                        hosts = ?state.pending_hosts(),
                        "[running] {pending} host(s) remaining... {}s elapsed",
                        elapsed.as_secs()
                    );
                    self.emit(EngineEvent::Heartbeat { pending, elapsed });
                }
            }
        }

        info!(
            outcomes = state.completed().len(),
            heartbeats = state.heartbeats(),
            elapsed_secs = started.elapsed().as_secs(),
            "run finished"
        );

        state.into_outcomes()
    }

    fn complete(&self, state: &mut RunState, outcome: Outcome) {
        debug!(
            host = %outcome.host,
            status = ?outcome.status,
            remaining = state.pending_count().saturating_sub(1),
            "host outcome recorded"
        );
        state.record(outcome);
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
