//! Script body generation and subprocess execution
//!
//! A generated script detaches stdin, redirects stderr to a private temp
//! file, exposes `$url` and `$iteration` as shell variables, and then runs
//! the configured command verbatim under `/bin/sh -c`. Stdout is the data
//! channel; the temp file is read back for a one-line diagnostic only when
//! the script fails, and is deleted afterwards on every path.

use crate::error::{ScriptCredsError, ScriptCredsResult};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

/// The two script-driven cache lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Header,
    Cookie,
}

impl ScriptKind {
    /// Name used in log and error messages
    pub fn label(self) -> &'static str {
        match self {
            ScriptKind::Header => "header-script",
            ScriptKind::Cookie => "cookie-script",
        }
    }
}

/// Outcome of one run attempt
pub(crate) struct ScriptRun {
    /// Stdout lines with trailing whitespace stripped, in output order.
    /// Populated even when the attempt failed.
    pub lines: Vec<String>,

    /// Whether the attempt succeeded
    pub outcome: ScriptCredsResult<()>,
}

impl ScriptRun {
    fn abort(err: ScriptCredsError) -> Self {
        Self {
            lines: Vec::new(),
            outcome: Err(err),
        }
    }
}

/// POSIX single-quote a string: `'` becomes `'\''`, everything else is
/// taken literally by the shell.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Build the full script body handed to `/bin/sh -c`.
fn build_script(command: &str, url: &str, iteration: u32, stderr_path: &Path) -> String {
    let mut script = String::new();
    script.push_str("exec </dev/null\n"); // Avoid stdin leaking into the child.
    script.push_str(&format!(
        "exec 2>{}\n", // Catch errors to a temporary file.
        shell_quote(&stderr_path.display().to_string())
    ));
    script.push_str(&format!("url={}\n", shell_quote(url)));
    script.push_str(&format!("iteration={iteration}\n"));
    script.push('\n');
    script.push_str(command);
    script
}

/// Execute one attempt of the kind's script.
///
/// The returned lines are whatever stdout produced, even on failure; the
/// caller decides what to keep. The child is always waited to completion.
pub(crate) async fn run_script(
    kind: ScriptKind,
    command: &str,
    url: &str,
    iteration: u32,
    timeout_secs: Option<u64>,
) -> ScriptRun {
    let label = kind.label();

    let stderr_file = match NamedTempFile::new() {
        Ok(file) => file,
        Err(e) => return ScriptRun::abort(ScriptCredsError::ScriptLaunch { label, source: e }),
    };

    let script = build_script(command, url, iteration, stderr_file.path());

    debug!("running {label} (iteration {iteration})");
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c")
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        // The script redirects its own stderr; anything before the
        // redirect takes effect (e.g. a shell parse error) goes to ours.
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    let output = match timeout_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), cmd.output()).await {
            Ok(result) => result,
            Err(_) => return ScriptRun::abort(ScriptCredsError::ScriptTimeout { label, secs }),
        },
        None => cmd.output().await,
    };

    let output = match output {
        Ok(output) => output,
        Err(e) => return ScriptRun::abort(ScriptCredsError::ScriptLaunch { label, source: e }),
    };

    let lines = split_lines(&output.stdout);

    let outcome = if output.status.success() {
        Ok(())
    } else {
        Err(ScriptCredsError::script_failed(
            label,
            first_stderr_line(stderr_file.path()),
        ))
    };

    ScriptRun { lines, outcome }
}

/// Split captured stdout into lines, stripping trailing whitespace from
/// each. Empty lines are kept; the cache decides what to skip.
fn split_lines(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect()
}

/// First line of the captured stderr file, if the script wrote anything.
/// Advisory only: enriches the failure message, never changes control flow.
fn first_stderr_line(path: &Path) -> Option<String> {
    let content = std::fs::read(path).ok()?;
    let text = String::from_utf8_lossy(&content);
    text.lines().next().map(|line| line.to_string())
}
