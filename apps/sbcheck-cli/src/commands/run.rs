// run.rs — Drive the probe catalog through the sandbox and report verdicts.
//
// Flow:
//   1. Import the sandbox's environment profile
//   2. Locate the sandbox binary and run its liveness check (fatal on fail)
//   3. One probe at a time: dispatch → classify → print → tally
//   4. Summary and exit code (1 iff any probe failed)
//
// No retries: a failed or warned probe never blocks the ones after it.
// Only the liveness check aborts the run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;

use sbcheck_probe::{ExecutionResult, SandboxClient};
use sbcheck_verdict::{
    builtin_catalog, classify, Invocation, RunStatus, Section, TallyState, Verdict, VerdictStatus,
};

use crate::profile;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Settings for one verification run.
pub struct RunConfig {
    /// Sandbox binary name (resolved on PATH) or path.
    pub sandbox: String,
    /// Override for the real-shell resolution.
    pub shell: Option<PathBuf>,
    /// Environment profile file to import; missing file is skipped.
    pub profile: PathBuf,
    pub exec_timeout: Duration,
    pub query_timeout: Duration,
}

/// One probe's outcome, as it appears in the JSON report.
#[derive(Debug, Serialize)]
pub struct ProbeRecord {
    pub section: String,
    pub description: String,
    pub verdict: Verdict,
}

/// The machine-readable run report (`sbcheck run --json`).
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub sandbox: String,
    pub status: RunStatus,
    #[serde(flatten)]
    pub tally: TallyState,
    pub probes: Vec<ProbeRecord>,
}

pub fn execute(config: &RunConfig, json: bool) -> anyhow::Result<i32> {
    profile::import(&config.profile)
        .with_context(|| format!("failed to read profile {}", config.profile.display()))?;

    let sandbox_bin = SandboxClient::locate(&config.sandbox)?;
    let mut client = SandboxClient::new(&sandbox_bin);
    if let Some(shell) = &config.shell {
        client.real_shell = shell.clone();
    }
    client.exec_timeout = config.exec_timeout;
    client.query_timeout = config.query_timeout;

    // Fatal: a sandbox that cannot answer its version flag would fail every
    // probe for the same uninteresting reason.
    client
        .check_alive()
        .context("sandbox liveness check failed; aborting before any probe")?;

    tracing::info!(sandbox = %sandbox_bin.display(), "starting verification run");

    let catalog = builtin_catalog();
    if !json {
        println!("\n=== Sandbox Policy Verification ===");
    }

    let (tally, probes) = run_catalog(&client, &catalog, json);

    if json {
        let report = RunReport {
            sandbox: sandbox_bin.display().to_string(),
            status: tally.run_status(),
            tally: tally.clone(),
            probes,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&tally);
    }

    Ok(tally.exit_code())
}

/// Sequentially execute every probe in the catalog.
///
/// `quiet` suppresses the per-probe lines (JSON mode accumulates instead).
fn run_catalog(
    client: &SandboxClient,
    catalog: &[Section],
    quiet: bool,
) -> (TallyState, Vec<ProbeRecord>) {
    let mut tally = TallyState::new();
    let mut records = Vec::with_capacity(catalog.iter().map(|s| s.probes.len()).sum());

    for section in catalog {
        if !quiet {
            println!("\nTesting {}:", section.title);
        }
        for probe in &section.probes {
            let result = dispatch(client, &probe.invocation);
            let verdict = classify(&probe.expectation, &result);
            if !quiet {
                print_probe_line(&probe.description, &verdict);
            }
            tally.record(verdict.status);
            records.push(ProbeRecord {
                section: section.title.clone(),
                description: probe.description.clone(),
                verdict,
            });
        }
    }

    (tally, records)
}

/// Route one invocation to the matching client operation.
fn dispatch(client: &SandboxClient, invocation: &Invocation) -> ExecutionResult {
    match invocation {
        Invocation::Shell { command } => client.exec_shell(command),
        Invocation::Argv { argv } => client.exec_argv(argv),
        Invocation::Query { op, path } => client.policy_query(op, path),
    }
}

fn print_probe_line(description: &str, verdict: &Verdict) {
    match verdict.status {
        VerdictStatus::Pass => match &verdict.note {
            Some(note) => println!("  {GREEN}\u{2713}{RESET} {description} ({note})"),
            None => println!("  {GREEN}\u{2713}{RESET} {description}"),
        },
        VerdictStatus::Warn => println!(
            "  {YELLOW}!{RESET} {description} ({})",
            verdict.note.as_deref().unwrap_or("inconclusive")
        ),
        VerdictStatus::Fail => println!(
            "  {RED}\u{2717}{RESET} {description} ({})",
            verdict.note.as_deref().unwrap_or("mismatch")
        ),
    }
}

fn print_summary(tally: &TallyState) {
    println!("\n=== Summary ===");
    println!("  Passed:   {}", tally.passed);
    println!("  Failed:   {}", tally.failed);
    println!("  Warnings: {}", tally.warnings);

    match tally.run_status() {
        RunStatus::Failed => {
            println!("\n{RED}Some probes failed. Check the policy configuration.{RESET}")
        }
        RunStatus::PassedWithWarnings => {
            println!("\n{YELLOW}All critical probes passed with some warnings.{RESET}")
        }
        RunStatus::Passed => println!("\n{GREEN}All probes passed!{RESET}"),
    }
}
