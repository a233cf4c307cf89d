// classify.rs — Signal-to-verdict classification.
//
// The sandbox's denial signal is not a single reliable channel: a rejected
// operation can surface as an explicit "denied"/"blocked" diagnostic, as a
// shell-level "command not found" (when the binary is deliberately absent
// from the image), or as an unrelated failure. The classifier distinguishes
// "proven denied", "plausibly denied via absence", and "inconclusive"
// instead of collapsing every non-zero exit into one bucket — otherwise a
// probe failing for an unrelated reason would read as "denied" forever.

use serde::{Deserialize, Serialize};
use tracing::debug;

use sbcheck_probe::ExecutionResult;

/// Output substrings that prove the policy layer rejected the operation.
const DENIAL_KEYWORDS: &[&str] = &["denied", "blocked"];

/// Output substrings meaning the probed binary is absent from the image —
/// accepted as a stand-in for denial (the path is unreachable either way).
const ABSENCE_KEYWORDS: &[&str] = &["not found", "no such file"];

/// Marker line emitted by the policy query subcommand.
const DECISION_MARKER: &str = "Decision:";

/// What a probe expects the sandbox to do.
///
/// The variants are also the classification strategy selector: `Allowed`,
/// `Denied`, and `FileReadable` judge heuristic text signals; `Decision`
/// judges the structured decision line. Probes migrate from the heuristic
/// to the structured path by changing variant, not the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "expect", rename_all = "snake_case")]
pub enum Expectation {
    /// The operation must succeed cleanly (exit 0).
    Allowed,
    /// The operation must be rejected.
    ///
    /// A target binary that is merely absent counts as an annotated Pass,
    /// identical in tally weight to an explicit denial. This is deliberate
    /// environment tolerance, not a bug: see DESIGN.md.
    Denied,
    /// The path must be readable; classified by the `Allowed` rule.
    FileReadable,
    /// The policy engine's `Decision:` word must match (case-insensitive).
    Decision { expected: String },
}

/// Tri-state judgment for one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Pass,
    Fail,
    Warn,
}

/// The classifier's judgment plus an optional short annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub note: Option<String>,
}

impl Verdict {
    fn pass() -> Self {
        Self {
            status: VerdictStatus::Pass,
            note: None,
        }
    }

    fn pass_with(note: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Pass,
            note: Some(note.into()),
        }
    }

    fn fail(note: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Fail,
            note: Some(note.into()),
        }
    }

    fn warn(note: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Warn,
            note: Some(note.into()),
        }
    }
}

/// Turn one probe's captured signals into a verdict.
pub fn classify(expectation: &Expectation, result: &ExecutionResult) -> Verdict {
    let verdict = match expectation {
        Expectation::Allowed | Expectation::FileReadable => classify_allowed(result),
        Expectation::Denied => classify_denied(result),
        Expectation::Decision { expected } => classify_decision(expected, result),
    };
    debug!(?expectation, exit_code = result.exit_code, status = ?verdict.status, "classified");
    verdict
}

/// Allowed rule: an allowed operation must succeed cleanly. Never Warn.
fn classify_allowed(result: &ExecutionResult) -> Verdict {
    if result.exit_code == 0 {
        Verdict::pass()
    } else {
        let snippet = result.stderr_snippet();
        if snippet.is_empty() {
            Verdict::fail("expected: allowed, got: blocked")
        } else {
            Verdict::fail(format!(
                "expected: allowed, got: blocked; stderr: {}",
                snippet
            ))
        }
    }
}

/// Denied rule: layered heuristic over the combined output blob.
fn classify_denied(result: &ExecutionResult) -> Verdict {
    if result.exit_code == 0 {
        return Verdict::fail("expected: denied, got: allowed");
    }
    let blob = result.combined_lower();
    if contains_any(&blob, DENIAL_KEYWORDS) {
        Verdict::pass()
    } else if contains_any(&blob, ABSENCE_KEYWORDS) {
        Verdict::pass_with("command not available")
    } else {
        Verdict::warn("command failed, unclear if policy")
    }
}

/// Decision rule: exact match against the parsed `Decision:` word.
/// A missing marker is a guaranteed mismatch, never an error. Never Warn.
fn classify_decision(expected: &str, result: &ExecutionResult) -> Verdict {
    let observed = parse_decision(&result.stdout);
    if observed == expected.to_lowercase() {
        Verdict::pass_with(observed)
    } else {
        Verdict::fail(format!("expected: {}, got: {}", expected, observed))
    }
}

/// Extract the decision word from the first `Decision:` line of a policy
/// query's stdout, trimmed and lowercased. Empty string when absent.
pub fn parse_decision(stdout: &str) -> String {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(DECISION_MARKER))
        .map(|rest| rest.trim().to_lowercase())
        .unwrap_or_default()
}

fn contains_any(blob: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| blob.contains(k))
}
