// client.rs — Bounded invocation of the sandbox binary.
//
// Every probe reaches the policy layer through one of three shapes:
//
// 1. Shell-wrapped:  sandbox exec -- <real-shell> -c "<command>"
// 2. Direct argv:    sandbox exec -- <argv...>
// 3. Policy query:   sandbox debug policy-test --op <op> --path <path>
//
// The shell-wrapped form runs beneath the sandbox's own `exec` entry point so
// the sandbox always sees and mediates the invocation, and it uses the *real*
// shell binary (not the shim the sandbox installs at /bin/bash) to avoid
// recursive interception. The direct form exercises command-level
// interception on argv[0]. The query form asks the policy engine for a
// decision without performing the operation.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

use tracing::debug;
use wait_timeout::ChildExt;

use crate::error::ProbeError;

/// Sentinel exit code for harness-level failures (timeout, spawn error).
///
/// Indistinguishable from a signal-terminated child on purpose: the
/// classifier treats both as "did not exit cleanly" and reads the stderr
/// text for anything further.
pub const HARNESS_EXIT: i32 = -1;

/// Where the sandbox keeps the unshimmed shell binary.
const REAL_SHELL: &str = "/usr/bin/bash.real";

/// Fallback shell when the shim is not installed.
const FALLBACK_SHELL: &str = "/bin/bash";

/// The raw signal set captured from one probe invocation.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Process exit code; [`HARNESS_EXIT`] for timeout/spawn failures.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ExecutionResult {
    /// Synthetic result for a failure of the harness's own plumbing.
    pub fn harness_failure(reason: impl Into<String>) -> Self {
        Self {
            exit_code: HARNESS_EXIT,
            stdout: String::new(),
            stderr: reason.into(),
        }
    }

    /// Combined stderr + stdout, lowercased, for keyword matching.
    ///
    /// stderr first: denial diagnostics land there, and on the off chance
    /// both streams carry a marker the order is irrelevant to `contains`.
    pub fn combined_lower(&self) -> String {
        let mut blob = String::with_capacity(self.stderr.len() + self.stdout.len());
        blob.push_str(&self.stderr);
        blob.push_str(&self.stdout);
        blob.to_lowercase()
    }

    /// First ~100 characters of stderr, for failure report lines.
    pub fn stderr_snippet(&self) -> &str {
        match self.stderr.char_indices().nth(100) {
            Some((idx, _)) => &self.stderr[..idx],
            None => &self.stderr,
        }
    }
}

/// Client for the sandbox binary under test.
///
/// Stateless across calls — each invocation spawns a fresh child with a hard
/// timeout and captures its output in full before returning.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    /// Path to the sandbox binary.
    pub sandbox_bin: PathBuf,
    /// The real (non-shimmed) shell used for shell-wrapped probes.
    pub real_shell: PathBuf,
    /// Timeout for execution probes.
    pub exec_timeout: Duration,
    /// Timeout for policy queries and the liveness check.
    pub query_timeout: Duration,
}

impl SandboxClient {
    /// Create a client with default timeouts (10s exec, 5s query).
    pub fn new(sandbox_bin: impl Into<PathBuf>) -> Self {
        Self {
            sandbox_bin: sandbox_bin.into(),
            real_shell: resolve_real_shell(),
            exec_timeout: Duration::from_secs(10),
            query_timeout: Duration::from_secs(5),
        }
    }

    /// Resolve the sandbox binary on PATH.
    pub fn locate(name: &str) -> Result<PathBuf, ProbeError> {
        which::which(name).map_err(|_| ProbeError::NotFound {
            name: name.to_string(),
        })
    }

    /// Liveness check: `sandbox --version`.
    ///
    /// A spawn failure, timeout, or non-zero exit here means the boundary
    /// under test is not operational — the run must abort before any probe
    /// executes, rather than drown the report in spurious failures.
    pub fn check_alive(&self) -> Result<(), ProbeError> {
        let mut cmd = Command::new(&self.sandbox_bin);
        cmd.arg("--version");
        let result = self.run_captured(cmd, self.query_timeout);

        if result.exit_code == 0 {
            Ok(())
        } else if result.exit_code == HARNESS_EXIT {
            Err(ProbeError::Liveness {
                detail: result.stderr,
            })
        } else {
            Err(ProbeError::Liveness {
                detail: format!("version check exited with status {}", result.exit_code),
            })
        }
    }

    /// Run a command string through the real shell, beneath `exec`.
    pub fn exec_shell(&self, command: &str) -> ExecutionResult {
        debug!(command, "shell-wrapped probe");
        let mut cmd = Command::new(&self.sandbox_bin);
        cmd.arg("exec")
            .arg("--")
            .arg(&self.real_shell)
            .arg("-c")
            .arg(command);
        self.run_captured(cmd, self.exec_timeout)
    }

    /// Run a literal argument vector beneath `exec`, with no shell.
    pub fn exec_argv<S: AsRef<str>>(&self, argv: &[S]) -> ExecutionResult {
        debug!(argv = ?argv.iter().map(|s| s.as_ref()).collect::<Vec<&str>>(), "direct probe");
        let mut cmd = Command::new(&self.sandbox_bin);
        cmd.arg("exec").arg("--");
        for arg in argv {
            cmd.arg(arg.as_ref());
        }
        self.run_captured(cmd, self.exec_timeout)
    }

    /// Ask the policy engine for its decision on an operation + path,
    /// without performing the operation.
    pub fn policy_query(&self, op: &str, path: &str) -> ExecutionResult {
        debug!(op, path, "policy query");
        let mut cmd = Command::new(&self.sandbox_bin);
        cmd.arg("debug")
            .arg("policy-test")
            .arg("--op")
            .arg(op)
            .arg("--path")
            .arg(path);
        self.run_captured(cmd, self.query_timeout)
    }

    /// Spawn, capture, and wait with a hard timeout.
    ///
    /// Stdout and stderr are drained by reader threads *before* the wait so
    /// a child that writes more than the pipe buffer cannot deadlock against
    /// a parent blocked in wait. On timeout the child is killed and reaped.
    fn run_captured(&self, mut cmd: Command, timeout: Duration) -> ExecutionResult {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return ExecutionResult::harness_failure(e.to_string()),
        };

        let (stdout_tx, stdout_rx) = mpsc::channel();
        let (stderr_tx, stderr_rx) = mpsc::channel();

        let stdout_thread = child.stdout.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                let _ = stdout_tx.send(buf);
            })
        });
        let stderr_thread = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                let _ = stderr_tx.send(buf);
            })
        });

        let status = match child.wait_timeout(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                // Timed out — kill, reap the zombie, and let the reader
                // threads finish as the pipes close.
                let _ = child.kill();
                let _ = child.wait();
                join_reader(stdout_thread);
                join_reader(stderr_thread);
                return ExecutionResult::harness_failure("timeout");
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                join_reader(stdout_thread);
                join_reader(stderr_thread);
                return ExecutionResult::harness_failure(e.to_string());
            }
        };

        join_reader(stdout_thread);
        join_reader(stderr_thread);

        let stdout = stdout_rx
            .recv()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default();
        let stderr = stderr_rx
            .recv()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default();

        ExecutionResult {
            // Signal-terminated children report no code; fold into the
            // harness sentinel.
            exit_code: status.code().unwrap_or(HARNESS_EXIT),
            stdout,
            stderr,
        }
    }
}

fn join_reader(handle: Option<std::thread::JoinHandle<()>>) {
    if let Some(handle) = handle {
        let _ = handle.join();
    }
}

/// Resolve the shell to wrap probe commands in.
///
/// The sandbox installs a shim at /bin/bash; the real binary is kept aside
/// as bash.real. Probes must use the real one so the only interception point
/// is the sandbox's own `exec` entry.
pub fn resolve_real_shell() -> PathBuf {
    let real = Path::new(REAL_SHELL);
    if real.exists() {
        real.to_path_buf()
    } else {
        PathBuf::from(FALLBACK_SHELL)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Helper: write an executable fake sandbox script and return its path.
    fn fake_sandbox(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("sandbox");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn client_for(dir: &TempDir, body: &str) -> SandboxClient {
        SandboxClient::new(fake_sandbox(dir, body))
    }

    #[test]
    fn captures_exit_code_and_both_streams() {
        let dir = TempDir::new().unwrap();
        let client = client_for(&dir, "echo out; echo err 1>&2; exit 3");

        let result = client.exec_shell("ignored");
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
    }

    #[test]
    fn shell_probe_wire_shape() {
        let dir = TempDir::new().unwrap();
        // Echo back the argv the fake sandbox received.
        let client = client_for(&dir, r#"echo "$@""#);

        let result = client.exec_shell("cat /etc/hostname");
        assert_eq!(result.exit_code, 0);
        assert!(result.stdout.starts_with("exec -- "));
        assert!(result.stdout.contains("-c cat /etc/hostname"));
    }

    #[test]
    fn argv_probe_wire_shape() {
        let dir = TempDir::new().unwrap();
        let client = client_for(&dir, r#"echo "$@""#);

        let result = client.exec_argv(&["rm", "-rf", "/tmp/nonexistent"]);
        assert_eq!(result.stdout, "exec -- rm -rf /tmp/nonexistent\n");
    }

    #[test]
    fn policy_query_wire_shape() {
        let dir = TempDir::new().unwrap();
        let client = client_for(&dir, r#"echo "$@""#);

        let result = client.policy_query("file_read", "/etc/hosts");
        assert_eq!(
            result.stdout,
            "debug policy-test --op file_read --path /etc/hosts\n"
        );
    }

    #[test]
    fn timeout_reports_sentinel_and_reaps() {
        let dir = TempDir::new().unwrap();
        let mut client = client_for(&dir, "sleep 30");
        client.exec_timeout = Duration::from_millis(100);

        let result = client.exec_shell("anything");
        assert_eq!(result.exit_code, HARNESS_EXIT);
        assert_eq!(result.stderr, "timeout");
        assert!(result.stdout.is_empty());
    }

    #[test]
    fn spawn_error_reports_sentinel() {
        let client = SandboxClient::new("/nonexistent/sandbox-binary");

        let result = client.exec_shell("anything");
        assert_eq!(result.exit_code, HARNESS_EXIT);
        assert!(!result.stderr.is_empty());
    }

    #[test]
    fn check_alive_passes_on_zero_exit() {
        let dir = TempDir::new().unwrap();
        let client = client_for(&dir, "echo sandbox 1.0; exit 0");

        assert!(client.check_alive().is_ok());
    }

    #[test]
    fn check_alive_fails_on_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let client = client_for(&dir, "exit 1");

        match client.check_alive() {
            Err(ProbeError::Liveness { detail }) => {
                assert!(detail.contains("status 1"));
            }
            other => panic!("expected Liveness error, got {:?}", other),
        }
    }

    #[test]
    fn check_alive_fails_on_missing_binary() {
        let client = SandboxClient::new("/nonexistent/sandbox-binary");

        match client.check_alive() {
            Err(ProbeError::Liveness { .. }) => {}
            other => panic!("expected Liveness error, got {:?}", other),
        }
    }

    #[test]
    fn locate_missing_binary_is_not_found() {
        match SandboxClient::locate("sbcheck-no-such-binary-on-path") {
            Err(ProbeError::NotFound { name }) => {
                assert_eq!(name, "sbcheck-no-such-binary-on-path");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn stderr_snippet_truncates_long_output() {
        let result = ExecutionResult {
            exit_code: 1,
            stdout: String::new(),
            stderr: "x".repeat(500),
        };
        assert_eq!(result.stderr_snippet().len(), 100);

        let short = ExecutionResult::harness_failure("timeout");
        assert_eq!(short.stderr_snippet(), "timeout");
    }

    #[test]
    fn combined_lower_merges_and_lowercases() {
        let result = ExecutionResult {
            exit_code: 1,
            stdout: "Operation DENIED".to_string(),
            stderr: "Error: ".to_string(),
        };
        assert_eq!(result.combined_lower(), "error: operation denied");
    }
}
