// profile.rs — Environment bootstrap from a shell profile file.
//
// The sandbox installer drops its environment (server socket, session id,
// shim paths) into a profile.d file as `export KEY="value"` lines. The
// harness imports those before the run so probes see the same environment
// an interactive shell under the sandbox would. Not part of the
// verification core; a missing file just means nothing to import.

use std::path::Path;

/// Parse `export KEY="value"` lines into key/value pairs.
///
/// Anything that is not an export line (comments, conditionals, blank
/// lines) is skipped. Surrounding single or double quotes are stripped.
pub fn parse(contents: &str) -> Vec<(String, String)> {
    let mut vars = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("export ") else {
            continue;
        };
        let Some((key, value)) = rest.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        vars.push((key.trim().to_string(), value.to_string()));
    }
    vars
}

/// Import the profile file into the process environment.
///
/// Returns how many variables were set. A missing file is not an error.
pub fn import(path: &Path) -> std::io::Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let contents = std::fs::read_to_string(path)?;
    let vars = parse(&contents);
    let count = vars.len();
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    tracing::debug!(path = %path.display(), count, "imported environment profile");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_export_lines_and_strips_quotes() {
        let vars = parse(
            "# sandbox environment\n\
             export SANDBOX_SOCKET=\"/run/sandbox.sock\"\n\
             export SANDBOX_SESSION='abc123'\n\
             export PLAIN=bare\n",
        );
        assert_eq!(
            vars,
            vec![
                ("SANDBOX_SOCKET".to_string(), "/run/sandbox.sock".to_string()),
                ("SANDBOX_SESSION".to_string(), "abc123".to_string()),
                ("PLAIN".to_string(), "bare".to_string()),
            ]
        );
    }

    #[test]
    fn skips_non_export_lines() {
        let vars = parse(
            "if [ -n \"$PS1\" ]; then\n\
             alias ll='ls -l'\n\
             fi\n\
             export ONLY=this\n",
        );
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].0, "ONLY");
    }

    #[test]
    fn keeps_equals_signs_inside_values() {
        let vars = parse("export OPTS=\"--level=2 --mode=fast\"\n");
        assert_eq!(vars[0].1, "--level=2 --mode=fast");
    }

    #[test]
    fn import_sets_process_environment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sandbox.sh");
        std::fs::write(&path, "export SBCHECK_PROFILE_TEST_VAR=\"hello\"\n").unwrap();

        let count = import(&path).unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            std::env::var("SBCHECK_PROFILE_TEST_VAR").unwrap(),
            "hello"
        );
    }

    #[test]
    fn import_missing_file_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let count = import(&dir.path().join("nope.sh")).unwrap();
        assert_eq!(count, 0);
    }
}
