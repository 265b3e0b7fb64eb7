// src/errors.rs

//! Crate-wide error types.
//!
//! - [`FleetError`] is fatal: it aborts a run before anything is dispatched.
//! - [`StepError`] belongs to a single host. It is turned into that host's
//!   [`Outcome`](crate::engine::Outcome) and never reaches other hosts.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of one step of a host workflow.
///
/// The `Display` output is exactly the terminal message recorded in the
/// host's outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("failed to copy script to {host}")]
    Transfer { host: String },

    #[error("failed to execute script on {host}")]
    Execution { host: String },

    #[error("failed to retrieve manifest from {host}")]
    Manifest { host: String },

    #[error("invalid manifest from {host}: {reason}")]
    InvalidManifest { host: String, reason: String },

    #[error("failed to retrieve {failed} of {total} artifact(s) from {host}")]
    Artifact {
        host: String,
        failed: usize,
        total: usize,
    },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FleetError>;
