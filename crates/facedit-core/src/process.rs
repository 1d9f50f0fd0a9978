//! External process helpers.
//!
//! Every invocation of the media tools goes through here so that they are
//! spawned with an explicit argument list (never through a shell), with no
//! stdin, and are killed if the waiting future is dropped.

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Result of waiting on a child process under a time limit.
#[derive(Debug)]
pub enum Completion {
    /// The process exited (successfully or not) within the limit.
    Finished(Output),
    /// The limit elapsed first; the child has been killed.
    TimedOut,
}

/// Build a tokio command for an external tool.
pub fn tool_command(program: &Path) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(target_os = "windows")]
    {
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

/// Blocking counterpart of [`tool_command`] for quick queries (`which`, `-version`).
///
/// Call from `spawn_blocking` or synchronous code, never directly on a runtime thread.
pub fn std_tool_command(program: impl AsRef<std::ffi::OsStr>) -> std::process::Command {
    let mut cmd = std::process::Command::new(program);
    cmd.stdin(Stdio::null());
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

/// Run a command to completion, collecting stdout and stderr, giving up after `limit`.
pub async fn output_with_timeout(
    cmd: &mut tokio::process::Command,
    limit: Duration,
) -> std::io::Result<Completion> {
    let child = cmd.spawn()?;
    match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(output) => Ok(Completion::Finished(output?)),
        // Dropping the future drops the child, and kill_on_drop reaps it.
        Err(_) => Ok(Completion::TimedOut),
    }
}

/// Merge stdout and stderr into one diagnostic string, the way a terminal would show them.
pub fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (true, true) => String::new(),
        (false, true) => stdout.trim().to_string(),
        (true, false) => stderr.trim().to_string(),
        (false, false) => format!("{}\n{}", stdout.trim(), stderr.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn std_tool_command_passes_arguments_verbatim() {
        let output = std_tool_command("echo").arg("$HOME; ls").output().unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "$HOME; ls");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tool_command_runs_without_shell_interpretation() {
        let mut cmd = tool_command(Path::new("echo"));
        cmd.arg("a; rm -rf /tmp/never");

        let completion = output_with_timeout(&mut cmd, Duration::from_secs(5))
            .await
            .unwrap();
        let Completion::Finished(output) = completion else {
            panic!("echo should not time out");
        };
        assert!(output.status.success());
        assert_eq!(
            String::from_utf8_lossy(&output.stdout).trim(),
            "a; rm -rf /tmp/never"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_with_timeout_reports_timeout() {
        let mut cmd = tool_command(Path::new("sleep"));
        cmd.arg("5");

        let completion = output_with_timeout(&mut cmd, Duration::from_millis(100))
            .await
            .unwrap();
        assert!(matches!(completion, Completion::TimedOut));
    }

    #[tokio::test]
    async fn missing_program_is_an_io_error() {
        let mut cmd = tool_command(Path::new("/nonexistent/definitely-not-a-tool"));
        let result = output_with_timeout(&mut cmd, Duration::from_secs(1)).await;
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn combined_output_joins_both_streams() {
        use std::os::unix::process::ExitStatusExt;

        let output = Output {
            status: std::process::ExitStatus::from_raw(256),
            stdout: b"out\n".to_vec(),
            stderr: b"err\n".to_vec(),
        };
        assert_eq!(combined_output(&output), "out\nerr");

        let output = Output {
            status: std::process::ExitStatus::from_raw(0),
            stdout: Vec::new(),
            stderr: b" only err ".to_vec(),
        };
        assert_eq!(combined_output(&output), "only err");
    }
}
