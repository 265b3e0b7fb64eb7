// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod notable;
pub mod report;
pub mod types;
pub mod workflow;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, RunScriptArgs};
use crate::config::{default_roster_path, load_and_validate, load_programs_list, RunSection};
use crate::engine::Engine;
use crate::errors::FleetError;
use crate::exec::{RemoteTransport, SshTransport};
use crate::fs::{FileSystem, RealFileSystem};
use crate::report::{render, RunReport};
use crate::types::Host;
use crate::workflow::{
    EnvFileWriter, HostWorkflow, ProgramEnable, ProgramSync, RemoteExecutor, ScriptWorkflow,
};

/// Everything resolved from the roster and CLI before any host is contacted.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub hosts: Vec<Host>,
    pub settings: RunSection,
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: RunReport,
    /// Text summary, empty when every host finished cleanly.
    pub summary: String,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - roster loading and CLI overrides
/// - the ssh transport and the local filesystem
/// - the selected workflow and the engine
/// - printing the summary (or JSON report) to stdout
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let plan = load_plan(&args)?;

    if args.dry_run {
        print_dry_run(&args, &plan);
        return Ok(RunReport::new(args.command.name(), &[]));
    }

    let transport: Arc<dyn RemoteTransport> = Arc::new(SshTransport::new());
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let output = run_with(&args, plan, transport, fs).await?;

    if args.json {
        println!("{}", output.report.to_json()?);
    } else {
        print!("{}", output.summary);
    }

    Ok(output.report)
}

/// Load the roster and shared program list, and apply CLI overrides.
pub fn load_plan(args: &CliArgs) -> Result<RunPlan> {
    let roster_path = args
        .roster
        .clone()
        .unwrap_or_else(|| default_roster_path(&args.data_dir));

    if !roster_path.exists() {
        return Err(FleetError::ConfigError(format!(
            "roster not found: {}",
            roster_path.display()
        ))
        .into());
    }

    let roster = load_and_validate(&roster_path)?;
    let shared_programs = load_programs_list(&args.data_dir)?;
    let settings = apply_overrides(roster.config.clone(), args)?;
    let hosts = roster.hosts(&shared_programs);

    info!(
        roster = %roster_path.display(),
        hosts = hosts.len(),
        shared_programs = shared_programs.len(),
        "roster loaded"
    );

    Ok(RunPlan { hosts, settings })
}

/// Run the selected workflow over the plan's hosts with the given
/// collaborators.
pub async fn run_with(
    args: &CliArgs,
    plan: RunPlan,
    transport: Arc<dyn RemoteTransport>,
    fs: Arc<dyn FileSystem>,
) -> Result<RunOutput> {
    let workflow = build_workflow(&args.command, &args.data_dir, &plan.settings, transport, fs)?;
    let engine = Engine::new(plan.settings.engine_options());

    let outcomes = engine.run(plan.hosts, workflow).await;
    let report = RunReport::new(args.command.name(), &outcomes);

    info!(
        workflow = %report.workflow,
        succeeded = report.succeeded(),
        failed = report.failed(),
        skipped = report.skipped(),
        "run complete"
    );

    Ok(RunOutput {
        summary: render(&outcomes),
        report,
    })
}

fn apply_overrides(mut settings: RunSection, args: &CliArgs) -> Result<RunSection> {
    if let Some(n) = args.max_concurrency {
        if n == 0 {
            let msg = "--max-concurrency must be >= 1".to_string();
            return Err(FleetError::ConfigError(msg).into());
        }
        settings.max_concurrency = n;
    }

    if let Some(secs) = args.heartbeat_secs {
        if secs == 0 {
            let msg = "--heartbeat-secs must be >= 1".to_string();
            return Err(FleetError::ConfigError(msg).into());
        }
        settings.heartbeat_secs = secs;
    }

    if let Command::RunScript(RunScriptArgs {
        per_host_artifacts: true,
        ..
    }) = &args.command
    {
        settings.per_host_artifacts = true;
    }

    Ok(settings)
}

fn build_workflow(
    command: &Command,
    data_dir: &Path,
    settings: &RunSection,
    transport: Arc<dyn RemoteTransport>,
    fs: Arc<dyn FileSystem>,
) -> Result<Arc<dyn HostWorkflow>> {
    let workflow: Arc<dyn HostWorkflow> = match command {
        Command::RunScript(script_args) => {
            let payload = script_args
                .script
                .clone()
                .unwrap_or_else(|| data_dir.join("script.py"));
            if !fs.is_file(&payload) {
                return Err(FleetError::ConfigError(format!(
                    "script not found: {}",
                    payload.display()
                ))
                .into());
            }

            let interpreter: Vec<String> = script_args
                .interpreter
                .split_whitespace()
                .map(str::to_string)
                .collect();
            if interpreter.is_empty() {
                let msg = "--interpreter must not be empty".to_string();
                return Err(FleetError::ConfigError(msg).into());
            }

            let dest: PathBuf = script_args
                .dest
                .clone()
                .unwrap_or_else(|| data_dir.join("images"));
            debug!(
                payload = %payload.display(),
                dest = %dest.display(),
                "script workflow configured"
            );

            let script = ScriptWorkflow::new(payload).with_interpreter(interpreter);
            Arc::new(
                RemoteExecutor::new(transport, fs, script, dest)
                    .with_per_host_artifacts(settings.per_host_artifacts),
            )
        }
        Command::CopyPrograms => Arc::new(ProgramSync::new(
            transport,
            data_dir,
            settings.remote_root.clone(),
        )),
        Command::EnablePrograms => {
            Arc::new(ProgramEnable::new(transport, settings.remote_root.clone()))
        }
        Command::WriteEnv => Arc::new(EnvFileWriter::new(
            transport,
            fs,
            data_dir,
            settings.remote_root.clone(),
        )),
    };

    Ok(workflow)
}

/// Simple dry-run output: print resolved hosts and settings.
fn print_dry_run(args: &CliArgs, plan: &RunPlan) {
    println!("fleetrun dry-run: {}", args.command.name());
    println!("  config.max_concurrency = {}", plan.settings.max_concurrency);
    println!("  config.heartbeat_secs = {}", plan.settings.heartbeat_secs);
    println!("  config.remote_root = {}", plan.settings.remote_root);
    println!(
        "  config.per_host_artifacts = {}",
        plan.settings.per_host_artifacts
    );
    println!();

    println!("hosts ({}):", plan.hosts.len());
    for host in &plan.hosts {
        match host.resolved_address() {
            Some(address) => println!("  - {} ({address})", host.id),
            None => println!("  - {} (skipped: no address)", host.id),
        }
        if !host.programs.is_empty() {
            println!("      programs: {:?}", host.programs);
        }
        if !host.env.is_empty() {
            let keys: Vec<&str> = host.env.keys().map(String::as_str).collect();
            println!("      env keys: {:?}", keys);
        }
    }

    debug!("dry-run complete (no hosts contacted)");
}
