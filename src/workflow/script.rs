// src/workflow/script.rs

//! Script workflow: push a payload to each host, run it, and collect the
//! artifacts it reports.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::Outcome;
use crate::errors::StepError;
use crate::exec::RemoteTransport;
use crate::fs::FileSystem;
use crate::types::Host;
use crate::workflow::manifest::parse_manifest;
use crate::workflow::{run_step, HostWorkflow, StepLog, WorkflowFuture};

/// What to run on each host and where it lives remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptWorkflow {
    /// Local script pushed to every host.
    pub payload: PathBuf,
    /// Command prefix the remote script is run with.
    pub interpreter: Vec<String>,
    /// Where the payload is copied to on the host.
    pub remote_script: String,
    /// Where the script leaves its manifest on the host.
    pub remote_manifest: String,
}

impl ScriptWorkflow {
    pub const DEFAULT_REMOTE_SCRIPT: &'static str = "/tmp/run-script.py";
    pub const DEFAULT_REMOTE_MANIFEST: &'static str = "/tmp/script_outputs.json";

    pub fn new(payload: impl Into<PathBuf>) -> Self {
        Self {
            payload: payload.into(),
            interpreter: vec!["python3".to_string()],
            remote_script: Self::DEFAULT_REMOTE_SCRIPT.to_string(),
            remote_manifest: Self::DEFAULT_REMOTE_MANIFEST.to_string(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Remote command line as an argument vector.
    pub fn command(&self) -> Vec<String> {
        self.interpreter
            .iter()
            .cloned()
            .chain(std::iter::once(self.remote_script.clone()))
            .collect()
    }
}

/// Runs a [`ScriptWorkflow`] on one host at a time.
///
/// Steps stop at the first failure, except artifact retrieval, which tries
/// every listed file and fails the host afterwards if any were missed.
pub struct RemoteExecutor {
    transport: Arc<dyn RemoteTransport>,
    fs: Arc<dyn FileSystem>,
    script: ScriptWorkflow,
    dest_dir: PathBuf,
    temp_dir: PathBuf,
    per_host_artifacts: bool,
}

impl std::fmt::Debug for RemoteExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteExecutor")
            .field("script", &self.script)
            .field("dest_dir", &self.dest_dir)
            .field("temp_dir", &self.temp_dir)
            .field("per_host_artifacts", &self.per_host_artifacts)
            .finish_non_exhaustive()
    }
}

impl RemoteExecutor {
    pub fn new(
        transport: Arc<dyn RemoteTransport>,
        fs: Arc<dyn FileSystem>,
        script: ScriptWorkflow,
        dest_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transport,
            fs,
            script,
            dest_dir: dest_dir.into(),
            temp_dir: std::env::temp_dir(),
            per_host_artifacts: false,
        }
    }

    /// Directory for the per-host manifest copies.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Store each host's artifacts in `<dest_dir>/<host id>/`.
    pub fn with_per_host_artifacts(mut self, enabled: bool) -> Self {
        self.per_host_artifacts = enabled;
        self
    }

    /// Local path the host's manifest is fetched to. Unique per host so
    /// concurrent hosts never share a file.
    pub fn manifest_path(&self, host: &Host) -> PathBuf {
        self.temp_dir
            .join(format!("script_outputs_{}.json", host.file_stem()))
    }

    /// Directory the host's artifacts land in.
    pub fn artifact_dir(&self, host: &Host) -> PathBuf {
        if self.per_host_artifacts {
            self.dest_dir.join(host.file_stem())
        } else {
            self.dest_dir.clone()
        }
    }

    /// Run the whole workflow for `host`.
    pub async fn execute(&self, host: &Host) -> Outcome {
        let Some(address) = host.resolved_address() else {
            return Outcome::skipped(host.id.clone());
        };

        let mut log = StepLog::default();
        match self.execute_steps(host, address, &mut log).await {
            Ok(artifacts) => {
                info!(host = %host.id, artifacts, "script workflow finished");
                Outcome::succeeded(host.id.clone(), log.into_lines())
            }
            Err(err) => {
                warn!(host = %host.id, error = %err, "script workflow failed");
                Outcome::failed(host.id.clone(), err.to_string(), log.into_lines())
            }
        }
    }

    async fn execute_steps(
        &self,
        host: &Host,
        address: &str,
        log: &mut StepLog,
    ) -> Result<usize, StepError> {
        let transport = self.transport.as_ref();

        // 1. Transfer.
        let out = run_step(
            host,
            "push-script",
            transport.push(&self.script.payload, address, &self.script.remote_script),
            log,
        )
        .await;
        if !out.success() {
            return Err(StepError::Transfer {
                host: address.to_string(),
            });
        }

        // 2. Remote invocation.
        let argv = self.script.command();
        let out = run_step(host, "run-script", transport.invoke(address, &argv), log).await;
        if !out.success() {
            return Err(StepError::Execution {
                host: address.to_string(),
            });
        }

        // 3. Manifest retrieval.
        let local_manifest = self.manifest_path(host);
        if self.fs.is_file(&local_manifest) {
            // A leftover copy from an earlier run must not pass for this one.
            if let Err(err) = self.fs.remove_file(&local_manifest) {
                debug!(host = %host.id, error = %err, "could not remove stale manifest");
            }
        }
        let out = run_step(
            host,
            "pull-manifest",
            transport.pull(address, &self.script.remote_manifest, &local_manifest),
            log,
        )
        .await;
        if !out.success() || !self.fs.is_file(&local_manifest) {
            return Err(StepError::Manifest {
                host: address.to_string(),
            });
        }

        // 4. Manifest validation.
        let manifest = self
            .fs
            .read_to_string(&local_manifest)
            .map_err(|e| format!("{e:#}"))
            .and_then(|text| parse_manifest(&text).map_err(|e| e.to_string()))
            .map_err(|reason| StepError::InvalidManifest {
                host: address.to_string(),
                reason,
            })?;
        debug!(host = %host.id, files = ?manifest.files, "manifest parsed");

        // 5. Artifacts.
        self.retrieve_artifacts(host, address, &manifest.files, log)
            .await
    }

    async fn retrieve_artifacts(
        &self,
        host: &Host,
        address: &str,
        files: &[String],
        log: &mut StepLog,
    ) -> Result<usize, StepError> {
        let total = files.len();
        let dest = self.artifact_dir(host);
        if let Err(err) = self.fs.create_dir_all(&dest) {
            log.note(format!("failed to create {}: {err:#}", dest.display()));
            return Err(StepError::Artifact {
                host: address.to_string(),
                failed: total,
                total,
            });
        }
        if total == 0 {
            return Ok(0);
        }

        let mut failed = 0usize;
        for remote_path in files {
            let Some(file_name) = Path::new(remote_path).file_name() else {
                log.note(format!(
                    "failed to retrieve {remote_path} from {address}: no file name"
                ));
                failed += 1;
                continue;
            };
            let local = dest.join(file_name);

            let out = run_step(
                host,
                "pull-artifact",
                self.transport.pull(address, remote_path, &local),
                log,
            )
            .await;
            if out.success() {
                debug!(
                    host = %host.id,
                    remote = %remote_path,
                    local = %local.display(),
                    "artifact retrieved"
                );
            } else {
                log.note(format!("failed to retrieve {remote_path} from {address}"));
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(StepError::Artifact {
                host: address.to_string(),
                failed,
                total,
            });
        }
        Ok(total)
    }
}

impl HostWorkflow for RemoteExecutor {
    fn name(&self) -> &str {
        "run-script"
    }

    fn execute<'a>(&'a self, host: &'a Host) -> WorkflowFuture<'a> {
        Box::pin(RemoteExecutor::execute(self, host))
    }
}
