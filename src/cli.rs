// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `fleetrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fleetrun",
    version,
    about = "Run a workflow on every host of a device roster in parallel.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory holding the roster, program trees, `list-of-programs` and
    /// `script.py`.
    #[arg(long, value_name = "DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Roster file (YAML or TOML).
    ///
    /// Default: `devices.yaml` inside `--data-dir`.
    #[arg(long, value_name = "PATH", global = true)]
    pub roster: Option<PathBuf>,

    /// Maximum number of hosts processed at once (overrides the roster).
    #[arg(long, value_name = "N", global = true)]
    pub max_concurrency: Option<usize>,

    /// Seconds without progress before a heartbeat is logged (overrides the
    /// roster).
    #[arg(long, value_name = "SECS", global = true)]
    pub heartbeat_secs: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FLEETRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Load and validate the roster, print the resolved hosts, but don't
    /// contact any of them.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print the report as JSON instead of the text summary.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Push a script to every host, run it, and collect the files it lists.
    RunScript(RunScriptArgs),
    /// Copy each host's program directories to it.
    CopyPrograms,
    /// Run `source setup` in each program directory on each host.
    EnablePrograms,
    /// Write `.env` files from `.env.example` templates and per-host values.
    WriteEnv,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::RunScript(_) => "run-script",
            Command::CopyPrograms => "copy-programs",
            Command::EnablePrograms => "enable-programs",
            Command::WriteEnv => "write-env",
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct RunScriptArgs {
    /// Script to run. Default: `script.py` inside `--data-dir`.
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Interpreter the script is run with on the host.
    #[arg(long, value_name = "PROGRAM", default_value = "python3")]
    pub interpreter: String,

    /// Where retrieved files are stored. Default: `images` inside
    /// `--data-dir`.
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Store each host's files in its own subdirectory of the destination.
    #[arg(long)]
    pub per_host_artifacts: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
