// src/workflow/env_file.rs

//! Writes `<remote_root>/<program>/env/.env` on each host from the program's
//! `.env.example` template and the host's `env` table.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::engine::Outcome;
use crate::exec::RemoteTransport;
use crate::fs::FileSystem;
use crate::types::Host;
use crate::workflow::programs::NO_PROGRAMS;
use crate::workflow::{run_step, HostWorkflow, StepLog, WorkflowFuture};

/// Keys declared by a `.env.example` file, in file order.
///
/// A key is the text before the first `=` on a non-blank, non-comment line.
pub fn extract_env_keys(template: &str) -> Vec<String> {
    template
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, _)| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .collect()
}

/// `KEY=value` lines for the template keys the host has values for.
///
/// Returns `None` when no key has a value.
pub fn render_env(keys: &[String], env: &BTreeMap<String, String>) -> Option<String> {
    let lines: Vec<String> = keys
        .iter()
        .filter_map(|key| env.get(key).map(|value| format!("{key}={value}")))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n") + "\n")
    }
}

enum ProgramResult {
    Written,
    Skipped(String),
    Failed,
}

pub struct EnvFileWriter {
    transport: Arc<dyn RemoteTransport>,
    fs: Arc<dyn FileSystem>,
    data_dir: PathBuf,
    remote_root: String,
    temp_dir: PathBuf,
}

impl EnvFileWriter {
    pub fn new(
        transport: Arc<dyn RemoteTransport>,
        fs: Arc<dyn FileSystem>,
        data_dir: impl Into<PathBuf>,
        remote_root: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            fs,
            data_dir: data_dir.into(),
            remote_root: remote_root.into(),
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Directory rendered files are staged in before upload.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn template_path(&self, program: &str) -> PathBuf {
        self.data_dir.join(program).join("env").join(".env.example")
    }

    fn remote_env_dir(&self, program: &str) -> String {
        format!("{}/{}/env", self.remote_root.trim_end_matches('/'), program)
    }

    /// Write `contents` to a fresh file in the staging directory.
    ///
    /// The file is created exclusively under a random name, readable only by
    /// the owner, and removed when the handle is dropped.
    fn stage(&self, contents: &str) -> std::io::Result<NamedTempFile> {
        let mut staged = tempfile::Builder::new()
            .prefix("fleetrun-env-")
            .tempfile_in(&self.temp_dir)?;
        staged.write_all(contents.as_bytes())?;
        staged.flush()?;
        Ok(staged)
    }

    pub async fn execute(&self, host: &Host) -> Outcome {
        let Some(address) = host.resolved_address() else {
            return Outcome::skipped(host.id.clone());
        };
        if host.programs.is_empty() {
            return Outcome::succeeded_with(host.id.clone(), NO_PROGRAMS, Vec::new());
        }

        let mut log = StepLog::default();
        let mut written = 0usize;
        let mut failed = 0usize;
        let mut skipped = Vec::new();

        for program in &host.programs {
            match self.write_program(host, address, program, &mut log).await {
                ProgramResult::Written => written += 1,
                ProgramResult::Failed => failed += 1,
                ProgramResult::Skipped(reason) => {
                    debug!(host = %host.id, program = %program, %reason, "env file skipped");
                    skipped.push(format!("{program} ({reason})"));
                }
            }
        }

        let total = host.programs.len();
        if failed > 0 {
            warn!(host = %host.id, failed, total, "env files failed");
            return Outcome::failed(
                host.id.clone(),
                format!("failed to write {failed} of {total} env file(s) on {address}"),
                log.into_lines(),
            );
        }

        info!(host = %host.id, written, skipped = skipped.len(), "env files written");
        if skipped.is_empty() {
            Outcome::succeeded(host.id.clone(), log.into_lines())
        } else {
            Outcome::succeeded_with(
                host.id.clone(),
                format!(
                    "wrote {written} env file(s); skipped {}",
                    skipped.join(", ")
                ),
                log.into_lines(),
            )
        }
    }

    async fn write_program(
        &self,
        host: &Host,
        address: &str,
        program: &str,
        log: &mut StepLog,
    ) -> ProgramResult {
        let template = self.template_path(program);
        if !self.fs.is_file(&template) {
            return ProgramResult::Skipped(".env.example not found".to_string());
        }

        let keys = match self.fs.read_to_string(&template) {
            Ok(text) => extract_env_keys(&text),
            Err(err) => {
                log.note(format!("failed to read {}: {err:#}", template.display()));
                return ProgramResult::Failed;
            }
        };
        if keys.is_empty() {
            return ProgramResult::Skipped("no keys in .env.example".to_string());
        }

        let Some(contents) = render_env(&keys, &host.env) else {
            return ProgramResult::Skipped("no matching env values".to_string());
        };

        let remote_dir = self.remote_env_dir(program);
        let transport = self.transport.as_ref();
        let argv = vec!["mkdir".to_string(), "-p".to_string(), remote_dir.clone()];
        let out = run_step(host, "mkdir", transport.invoke(address, &argv), log).await;
        if !out.success() {
            log.note(format!("failed to create {remote_dir} on {address}"));
            return ProgramResult::Failed;
        }

        let staged = match self.stage(&contents) {
            Ok(staged) => staged,
            Err(err) => {
                log.note(format!("failed to stage env file for {program}: {err}"));
                return ProgramResult::Failed;
            }
        };

        let remote_file = format!("{remote_dir}/.env");
        let out = run_step(
            host,
            "push-env",
            transport.push(staged.path(), address, &remote_file),
            log,
        )
        .await;
        if let Err(err) = staged.close() {
            debug!(program = %program, error = %err, "could not remove staged env file");
        }

        if out.success() {
            info!(host = %host.id, program = %program, keys = keys.len(), "env file written");
            ProgramResult::Written
        } else {
            log.note(format!("failed to write {remote_file} on {address}"));
            ProgramResult::Failed
        }
    }
}

impl HostWorkflow for EnvFileWriter {
    fn name(&self) -> &str {
        "write-env"
    }

    fn execute<'a>(&'a self, host: &'a Host) -> WorkflowFuture<'a> {
        Box::pin(EnvFileWriter::execute(self, host))
    }
}
