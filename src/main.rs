// src/main.rs

use fleetrun::{cli, logging, run};

/// Exit status for errors that stop a run before any host is contacted.
const EXIT_FATAL: i32 = 2;

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("fleetrun error: {err:?}");
            std::process::exit(EXIT_FATAL);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let report = run(args).await?;
    Ok(report.exit_code())
}
