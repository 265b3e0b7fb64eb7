// src/exec/transport.rs

//! Pluggable remote-access abstraction.
//!
//! Workflows talk to a `RemoteTransport` instead of spawning `ssh` directly.
//! Production uses [`SshTransport`](super::SshTransport); tests provide a
//! scripted implementation that never touches the network.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use anyhow::Result;

/// Exit status and captured output of one remote-access command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_status(status: i32) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Output standing in for a command that could not be started at all.
    ///
    /// The error text lands in `stderr` so it is picked up as a notable line.
    pub fn spawn_failure(err: &anyhow::Error) -> Self {
        Self {
            status: -1,
            stdout: String::new(),
            stderr: format!("error: {err:#}"),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>>;

/// Primitive remote operations a workflow is built from.
///
/// `Err` means the command could not be run at all; a command that ran and
/// failed is `Ok` with a non-zero `status`. Remote commands are argument
/// vectors, never pre-joined shell strings.
pub trait RemoteTransport: Send + Sync {
    /// Copy a local file to `remote_path` on `host`.
    fn push<'a>(&'a self, local: &'a Path, host: &'a str, remote_path: &'a str)
        -> TransportFuture<'a>;

    /// Copy `remote_path` on `host` to a local file.
    fn pull<'a>(&'a self, host: &'a str, remote_path: &'a str, local: &'a Path)
        -> TransportFuture<'a>;

    /// Run `argv` on `host`.
    fn invoke<'a>(&'a self, host: &'a str, argv: &'a [String]) -> TransportFuture<'a>;

    /// Mirror a local directory into `remote_dir` on `host`, skipping
    /// entries matching `excludes`.
    fn sync_tree<'a>(
        &'a self,
        local_dir: &'a Path,
        host: &'a str,
        remote_dir: &'a str,
        excludes: &'a [String],
    ) -> TransportFuture<'a>;
}
