// src/workflow/mod.rs

//! Per-host workflows.
//!
//! A workflow is everything that happens on one host during a run. The
//! engine knows nothing about what a workflow does; it only needs an
//! [`Outcome`] back.
//!
//! - [`script`] holds `RemoteExecutor`: push a script, run it, collect the
//!   artifacts it lists in its manifest.
//! - [`programs`] mirrors program directories to hosts and runs their
//!   `setup` files.
//! - [`env_file`] renders per-host `.env` files from `.env.example`
//!   templates.
//! - [`manifest`] parses the manifest written by remote scripts.

use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::engine::Outcome;
use crate::exec::{CommandOutput, TransportFuture};
use crate::notable;
use crate::types::Host;

pub mod env_file;
pub mod manifest;
pub mod programs;
pub mod script;

pub use env_file::EnvFileWriter;
pub use manifest::{parse_manifest, Manifest, ManifestError};
pub use programs::{ProgramEnable, ProgramSync};
pub use script::{RemoteExecutor, ScriptWorkflow};

pub type WorkflowFuture<'a> = Pin<Box<dyn Future<Output = Outcome> + Send + 'a>>;

/// Work performed on a single host.
///
/// Implementations must not panic on remote failures: every failure becomes
/// part of the returned outcome. They hold no state about other hosts.
pub trait HostWorkflow: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn execute<'a>(&'a self, host: &'a Host) -> WorkflowFuture<'a>;
}

/// Notable lines gathered across the steps of one host's workflow.
#[derive(Debug, Default)]
pub(crate) struct StepLog {
    lines: Vec<String>,
}

impl StepLog {
    /// Keep the notable lines of a step's output, whatever its status.
    pub(crate) fn absorb(&mut self, output: &CommandOutput) {
        self.lines
            .extend(notable::extract([output.stdout.as_str(), output.stderr.as_str()]));
    }

    pub(crate) fn note(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub(crate) fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Await a transport call, folding "could not run at all" into a failed
/// [`CommandOutput`], and record its notable lines.
pub(crate) async fn run_step(
    host: &Host,
    step: &str,
    call: TransportFuture<'_>,
    log: &mut StepLog,
) -> CommandOutput {
    let output = match call.await {
        Ok(output) => output,
        Err(err) => {
            warn!(host = %host.id, step, error = %err, "transport command could not run");
            CommandOutput::spawn_failure(&err)
        }
    };
    log.absorb(&output);
    output
}
