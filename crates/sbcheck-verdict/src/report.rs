// report.rs — Run tallies and the exit-code policy.
//
// Only explicit mismatches (Fail) block: warnings are surfaced but keep a
// success exit, so an ambiguous signal cannot make a correct policy
// configuration look broken in automation.

use serde::{Deserialize, Serialize};

use crate::classify::VerdictStatus;

/// Aggregate outcome of a full run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    PassedWithWarnings,
    Failed,
}

/// Process-wide accumulator for a single run.
///
/// Invariant: `passed + failed + warnings` equals the number of probes
/// executed so far — one `record` per completed probe, nothing else.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TallyState {
    pub passed: u32,
    pub failed: u32,
    pub warnings: u32,
}

impl TallyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one verdict into the tallies.
    pub fn record(&mut self, status: VerdictStatus) {
        match status {
            VerdictStatus::Pass => self.passed += 1,
            VerdictStatus::Fail => self.failed += 1,
            VerdictStatus::Warn => self.warnings += 1,
        }
    }

    /// Number of probes recorded so far.
    pub fn total(&self) -> u32 {
        self.passed + self.failed + self.warnings
    }

    pub fn run_status(&self) -> RunStatus {
        if self.failed > 0 {
            RunStatus::Failed
        } else if self.warnings > 0 {
            RunStatus::PassedWithWarnings
        } else {
            RunStatus::Passed
        }
    }

    /// Harness process exit code: 1 iff any probe failed.
    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 {
            1
        } else {
            0
        }
    }
}
