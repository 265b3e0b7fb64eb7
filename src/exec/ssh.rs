// src/exec/ssh.rs

//! `RemoteTransport` backed by the OpenSSH client tools.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::debug;

use super::transport::{CommandOutput, RemoteTransport, TransportFuture};

/// Runs `scp`, `ssh` and `rsync` as child processes.
///
/// Every program is started with an explicit argument list; no local shell
/// is involved. Arguments that reach the remote shell are quoted with
/// [`shell_quote`].
#[derive(Debug, Clone)]
pub struct SshTransport {
    ssh: String,
    scp: String,
    rsync: String,
    options: Vec<String>,
}

impl Default for SshTransport {
    fn default() -> Self {
        Self {
            ssh: "ssh".to_string(),
            scp: "scp".to_string(),
            rsync: "rsync".to_string(),
            // Never prompt: an interactive password prompt would hang the
            // worker slot.
            options: vec!["-o".to_string(), "BatchMode=yes".to_string()],
        }
    }
}

impl SshTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn run(&self, program: &str, args: Vec<OsString>) -> Result<CommandOutput> {
        debug!(program, ?args, "running transport command");

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("spawning '{program}'"))?;

        let status = output.status.code().unwrap_or(-1);
        debug!(program, status, "transport command exited");

        Ok(CommandOutput {
            status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn scp_args(&self, from: OsString, to: OsString) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.options.iter().map(OsString::from).collect();
        args.push("--".into());
        args.push(from);
        args.push(to);
        args
    }

    /// `ssh` command line handed to `rsync -e`.
    fn rsync_shell(&self) -> String {
        std::iter::once(self.ssh.as_str())
            .chain(self.options.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn remote_spec(host: &str, path: &str) -> OsString {
    format!("{host}:{path}").into()
}

impl RemoteTransport for SshTransport {
    fn push<'a>(
        &'a self,
        local: &'a Path,
        host: &'a str,
        remote_path: &'a str,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let args = self.scp_args(local.as_os_str().to_owned(), remote_spec(host, remote_path));
            self.run(&self.scp, args).await
        })
    }

    fn pull<'a>(
        &'a self,
        host: &'a str,
        remote_path: &'a str,
        local: &'a Path,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let args = self.scp_args(remote_spec(host, remote_path), local.as_os_str().to_owned());
            self.run(&self.scp, args).await
        })
    }

    fn invoke<'a>(&'a self, host: &'a str, argv: &'a [String]) -> TransportFuture<'a> {
        Box::pin(async move {
            let mut args: Vec<OsString> = self.options.iter().map(OsString::from).collect();
            args.push("--".into());
            args.push(host.into());
            args.push(remote_command_line(argv).into());
            self.run(&self.ssh, args).await
        })
    }

    fn sync_tree<'a>(
        &'a self,
        local_dir: &'a Path,
        host: &'a str,
        remote_dir: &'a str,
        excludes: &'a [String],
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let mut args: Vec<OsString> = vec!["-a".into()];
            for pattern in excludes {
                args.push(format!("--exclude={pattern}").into());
            }
            args.push("-e".into());
            args.push(self.rsync_shell().into());
            args.push("--".into());
            args.push(local_dir.as_os_str().to_owned());
            args.push(remote_spec(host, remote_dir));
            self.run(&self.rsync, args).await
        })
    }
}

/// Join an argument vector into one line for the remote shell, quoting each
/// argument so it arrives as a single word.
pub fn remote_command_line(argv: &[String]) -> String {
    argv.iter()
        .map(|a| shell_quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote `arg` for a POSIX shell.
///
/// Words made only of characters with no shell meaning are returned as-is;
/// everything else is wrapped in single quotes, with embedded single quotes
/// written as `'\''`.
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));

    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
