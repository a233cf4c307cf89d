//! # sbcheck-cli
//!
//! Command-line verification harness for a sandbox policy layer.
//!
//! Issues probe operations through the sandbox boundary and checks that the
//! observable behavior matches the expected policy outcome:
//! - `sbcheck run` — execute the built-in probe catalog, print a verdict
//!   per probe and a summary; exit 1 iff any probe failed
//! - `sbcheck catalog` — list the catalog without executing anything

mod commands;
mod profile;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::run::RunConfig;

/// Sandbox policy verification harness.
#[derive(Parser)]
#[command(name = "sbcheck", version, about)]
struct Cli {
    /// Sandbox binary to probe through (name on PATH or a path).
    #[arg(long, default_value = "sandbox")]
    sandbox: String,

    /// Real shell for shell-wrapped probes (overrides shim detection).
    #[arg(long)]
    shell: Option<PathBuf>,

    /// Environment profile file imported before the run.
    #[arg(long, default_value = "/etc/profile.d/sandbox.sh")]
    profile: PathBuf,

    /// Timeout for execution probes, in seconds.
    #[arg(long, default_value_t = 10)]
    exec_timeout: u64,

    /// Timeout for policy queries and the liveness check, in seconds.
    #[arg(long, default_value_t = 5)]
    query_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the built-in probe catalog against the sandbox.
    Run {
        /// Emit a machine-readable JSON report instead of colored text.
        #[arg(long)]
        json: bool,
    },
    /// List the probe catalog without executing anything.
    Catalog {
        /// Emit the catalog as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interfere with the report on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { json } => {
            let config = RunConfig {
                sandbox: cli.sandbox.clone(),
                shell: cli.shell.clone(),
                profile: cli.profile.clone(),
                exec_timeout: Duration::from_secs(cli.exec_timeout),
                query_timeout: Duration::from_secs(cli.query_timeout),
            };
            let exit_code = commands::run::execute(&config, *json)?;
            std::process::exit(exit_code);
        }
        Commands::Catalog { json } => commands::catalog::execute(*json),
    }
}
