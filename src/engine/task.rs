// src/engine/task.rs

//! One host's unit of work inside the worker pool.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::engine::{EngineEvent, Outcome, TaskState};
use crate::types::Host;
use crate::workflow::HostWorkflow;

/// A pending unit of work bound to exactly one host and one workflow.
///
/// Consumed by [`Task::run`]; a task is executed at most once.
pub struct Task {
    host: Host,
    workflow: Arc<dyn HostWorkflow>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("host", &self.host.id)
            .field("workflow", &self.workflow.name())
            .finish()
    }
}

impl Task {
    pub fn new(host: Host, workflow: Arc<dyn HostWorkflow>) -> Self {
        Self { host, workflow }
    }

    /// Wait for a worker slot, then run the workflow to completion.
    ///
    /// The slot is held until the terminal state has been published, so an
    /// observer never sees more than `permits` tasks in `Running`.
    pub async fn run(
        self,
        permits: Arc<Semaphore>,
        events: Option<mpsc::UnboundedSender<EngineEvent>>,
    ) -> Outcome {
        let id = self.host.id.clone();
        publish(&events, &id, TaskState::Pending);

        let _permit = match permits.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!(host = %id, "worker pool closed before task could start");
                publish(&events, &id, TaskState::Failed);
                return Outcome::failed(id, "worker pool closed before dispatch", Vec::new());
            }
        };

        publish(&events, &id, TaskState::Running);
        info!(host = %id, workflow = self.workflow.name(), "host task started");

        let outcome = self.workflow.execute(&self.host).await;

        let state = if outcome.is_failure() {
            TaskState::Failed
        } else {
            TaskState::Succeeded
        };
        debug!(host = %id, ?state, message = %outcome.message, "host task finished");
        publish(&events, &id, state);

        outcome
    }
}

fn publish(events: &Option<mpsc::UnboundedSender<EngineEvent>>, host: &str, state: TaskState) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is watching.
        let _ = tx.send(EngineEvent::Transition {
            host: host.to_string(),
            state,
        });
    }
}
