//! # sbcheck-probe
//!
//! Process invocation layer for the sbcheck verification harness.
//!
//! A probe is one command or query issued *through* the sandbox boundary
//! under test. This crate captures the externally observable signals of a
//! probe — exit code, stdout, stderr — without ever treating the probe's own
//! failure as a harness error: a denial is a normal, expected result.
//!
//! ## Key invariants
//!
//! - **Probes never hang**: every invocation has a hard timeout, after which
//!   the child is killed and reaped and the probe reports a synthetic result.
//! - **Probes never raise**: spawn errors and timeouts surface as an
//!   [`ExecutionResult`] with the `-1` sentinel exit code, so the classifier
//!   sees one uniform signal shape.
//! - **Fatal errors are separate**: only the liveness check (the sandbox
//!   binary missing or broken) produces a [`ProbeError`], which aborts the
//!   run before any probe executes.

pub mod client;
pub mod error;

pub use client::{ExecutionResult, SandboxClient, HARNESS_EXIT};
pub use error::ProbeError;
