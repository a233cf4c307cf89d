//! # sbcheck-verdict
//!
//! Outcome classification for the sbcheck verification harness.
//!
//! Maps the raw signals of one probe ([`sbcheck_probe::ExecutionResult`])
//! onto a tri-state [`Verdict`] (Pass / Fail / Warn), given the probe's
//! [`Expectation`]. Also holds the declarative [`Probe`] catalog and the
//! [`TallyState`] accumulator the runner folds verdicts into.
//!
//! ## Key invariants
//!
//! - **Every probe yields exactly one verdict**, never revised.
//! - **Ambiguity resolves to Warn**: a probe that failed for a reason the
//!   harness cannot attribute to the policy layer is surfaced, not counted
//!   as a pass or a fail.
//! - **Only Fail blocks**: the run's exit code is 1 iff any probe failed;
//!   warnings alone still exit 0.

pub mod catalog;
pub mod classify;
pub mod report;

pub use catalog::{builtin_catalog, Invocation, Probe, Section};
pub use classify::{classify, parse_decision, Expectation, Verdict, VerdictStatus};
pub use report::{RunStatus, TallyState};
