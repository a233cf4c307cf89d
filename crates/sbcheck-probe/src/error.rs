// error.rs — Fatal, run-level errors for the probe layer.
//
// Per-probe failures (timeouts, spawn errors, denials) are NOT errors — they
// become synthetic ExecutionResults and flow through classification like any
// other signal. The variants here abort the whole run before it starts.

use thiserror::Error;

/// Errors that abort a verification run before any probe executes.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The sandbox binary could not be located on PATH.
    #[error("sandbox binary '{name}' not found on PATH")]
    NotFound { name: String },

    /// The sandbox binary was found but its liveness check failed.
    #[error("sandbox liveness check failed: {detail}")]
    Liveness { detail: String },
}
