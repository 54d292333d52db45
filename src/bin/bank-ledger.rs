use std::{env, fs::File};

use anyhow::{Context, Result};
use bank_ledger::bin_utils::Service;
use tracing_subscriber::EnvFilter;

const WORKERS_ENV: &str = "LEDGER_WORKERS";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the CSV report
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn workers() -> Result<usize> {
    let Ok(value) = env::var(WORKERS_ENV) else {
        return Ok(1);
    };
    let workers: usize = value
        .trim()
        .parse()
        .with_context(|| format!("{WORKERS_ENV} must be a positive integer, got `{value}`"))?;
    if workers == 0 {
        anyhow::bail!("{WORKERS_ENV} must be a positive integer, got `{value}`");
    }
    Ok(workers)
}

fn main() -> Result<()> {
    init_tracing();
    let filename = env::args()
        .nth(1)
        .context("Expected a file name as the first argument")?;
    let file = File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?;

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        workers: workers()?,
        error_printer: Box::new(|line, err| eprintln!("Error at line {line}: {err}")),
    };
    service.run()
}
