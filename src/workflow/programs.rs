// src/workflow/programs.rs

//! Workflows that install program directories on hosts and enable them.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::Outcome;
use crate::exec::RemoteTransport;
use crate::types::Host;
use crate::workflow::{run_step, HostWorkflow, StepLog, WorkflowFuture};

/// Message of a host with an empty program list.
pub const NO_PROGRAMS: &str = "no programs configured";

/// `mkdir -p <dir>` on the host. Returns `false` (with a note) on failure.
async fn ensure_remote_dir(
    transport: &dyn RemoteTransport,
    host: &Host,
    address: &str,
    dir: &str,
    log: &mut StepLog,
) -> bool {
    let argv = vec!["mkdir".to_string(), "-p".to_string(), dir.to_string()];
    let out = run_step(host, "mkdir", transport.invoke(address, &argv), log).await;
    if !out.success() {
        log.note(format!("failed to create {dir} on {address}"));
    }
    out.success()
}

/// Turn per-program failure counts into the host's outcome.
fn summarize(host: &Host, verb: &str, address: &str, failed: usize, log: StepLog) -> Outcome {
    let total = host.programs.len();
    if failed > 0 {
        warn!(host = %host.id, failed, total, "program workflow had failures");
        Outcome::failed(
            host.id.clone(),
            format!("failed to {verb} {failed} of {total} program(s) on {address}"),
            log.into_lines(),
        )
    } else {
        info!(host = %host.id, total, "program workflow finished");
        Outcome::succeeded(host.id.clone(), log.into_lines())
    }
}

/// Mirrors `<data_dir>/<program>` into `<remote_root>/` on every host.
pub struct ProgramSync {
    transport: Arc<dyn RemoteTransport>,
    data_dir: PathBuf,
    remote_root: String,
    excludes: Vec<String>,
}

impl ProgramSync {
    pub fn new(
        transport: Arc<dyn RemoteTransport>,
        data_dir: impl Into<PathBuf>,
        remote_root: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            data_dir: data_dir.into(),
            remote_root: remote_root.into(),
            excludes: vec![".git".to_string()],
        }
    }

    pub async fn execute(&self, host: &Host) -> Outcome {
        let Some(address) = host.resolved_address() else {
            return Outcome::skipped(host.id.clone());
        };
        if host.programs.is_empty() {
            return Outcome::succeeded_with(host.id.clone(), NO_PROGRAMS, Vec::new());
        }

        let transport = self.transport.as_ref();
        let mut log = StepLog::default();

        if !ensure_remote_dir(transport, host, address, &self.remote_root, &mut log).await {
            return Outcome::failed(
                host.id.clone(),
                format!("failed to prepare {} on {address}", self.remote_root),
                log.into_lines(),
            );
        }

        let target = format!("{}/", self.remote_root.trim_end_matches('/'));
        let mut failed = 0usize;
        for program in &host.programs {
            info!(host = %host.id, program = %program, "copying program");
            let local = self.data_dir.join(program);
            let out = run_step(
                host,
                "sync-program",
                transport.sync_tree(&local, address, &target, &self.excludes),
                &mut log,
            )
            .await;
            if !out.success() {
                log.note(format!("failed to copy {program} to {address}"));
                failed += 1;
            }
        }

        summarize(host, "copy", address, failed, log)
    }
}

impl HostWorkflow for ProgramSync {
    fn name(&self) -> &str {
        "copy-programs"
    }

    fn execute<'a>(&'a self, host: &'a Host) -> WorkflowFuture<'a> {
        Box::pin(ProgramSync::execute(self, host))
    }
}

/// Runs `source setup` inside each program directory on the host.
pub struct ProgramEnable {
    transport: Arc<dyn RemoteTransport>,
    remote_root: String,
}

impl ProgramEnable {
    pub fn new(transport: Arc<dyn RemoteTransport>, remote_root: impl Into<String>) -> Self {
        Self {
            transport,
            remote_root: remote_root.into(),
        }
    }

    /// Remote argument vector enabling one program.
    ///
    /// The directory travels as a positional parameter, never spliced into
    /// the script text.
    pub fn enable_command(&self, program: &str) -> Vec<String> {
        vec![
            "bash".to_string(),
            "-c".to_string(),
            r#"cd "$1" && source setup"#.to_string(),
            "enable".to_string(),
            format!("{}/{}", self.remote_root.trim_end_matches('/'), program),
        ]
    }

    pub async fn execute(&self, host: &Host) -> Outcome {
        let Some(address) = host.resolved_address() else {
            return Outcome::skipped(host.id.clone());
        };
        if host.programs.is_empty() {
            return Outcome::succeeded_with(host.id.clone(), NO_PROGRAMS, Vec::new());
        }

        let transport = self.transport.as_ref();
        let mut log = StepLog::default();

        if !ensure_remote_dir(transport, host, address, &self.remote_root, &mut log).await {
            return Outcome::failed(
                host.id.clone(),
                format!("failed to prepare {} on {address}", self.remote_root),
                log.into_lines(),
            );
        }

        let mut failed = 0usize;
        for program in &host.programs {
            info!(host = %host.id, program = %program, "enabling program");
            let argv = self.enable_command(program);
            let out = run_step(
                host,
                "enable-program",
                transport.invoke(address, &argv),
                &mut log,
            )
            .await;
            if !out.success() {
                log.note(format!("failed to enable {program} on {address}"));
                failed += 1;
            }
        }

        summarize(host, "enable", address, failed, log)
    }
}

impl HostWorkflow for ProgramEnable {
    fn name(&self) -> &str {
        "enable-programs"
    }

    fn execute<'a>(&'a self, host: &'a Host) -> WorkflowFuture<'a> {
        Box::pin(ProgramEnable::execute(self, host))
    }
}
