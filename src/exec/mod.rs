// src/exec/mod.rs

//! Remote execution layer.
//!
//! This module is responsible for actually reaching the hosts: copying
//! files, running commands and mirroring directory trees, using
//! `tokio::process::Command`.
//!
//! - [`transport`] provides the `RemoteTransport` trait the workflows are
//!   written against, and which tests replace with a scripted fake.
//! - [`ssh`] holds `SshTransport`, the production implementation, and the
//!   quoting helpers for remote command lines.

pub mod ssh;
pub mod transport;

pub use ssh::{remote_command_line, shell_quote, SshTransport};
pub use transport::{CommandOutput, RemoteTransport, TransportFuture};
