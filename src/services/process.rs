use crate::config::ToolCommand;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Captured text of one external tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {} seconds.", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("Failed while waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for running the external conversion and validation tools
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `command` with `paths` appended to its arguments, capturing stdout and stderr
    async fn run(&self, command: &ToolCommand, paths: &[&Path]) -> Result<ToolOutput, ProcessError>;
}

/// Runs tools as child processes of the server, killing them when the timeout expires
pub struct SystemProcessRunner {
    timeout: Duration,
}

impl SystemProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, command: &ToolCommand, paths: &[&Path]) -> Result<ToolOutput, ProcessError> {
        tracing::debug!("Running {} {:?}", command, paths);

        let child = Command::new(&command.program)
            .args(&command.args)
            .args(paths)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout must not leave the tool running
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProcessError::Timeout {
                program: command.program.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| ProcessError::Wait {
                program: command.program.clone(),
                source,
            })?;

        tracing::debug!("{} exited with {}", command.program, output.status);

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_both_streams() {
        let runner = SystemProcessRunner::new(Duration::from_secs(10));
        let cmd = ToolCommand::new("sh", &["-c", "echo out; echo err >&2"]);
        let output = runner.run(&cmd, &[]).await.unwrap();
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_paths_are_appended() {
        let runner = SystemProcessRunner::new(Duration::from_secs(10));
        let cmd = ToolCommand::new("echo", &["-n"]);
        let output = runner
            .run(&cmd, &[Path::new("a.xls"), Path::new("a.xml")])
            .await
            .unwrap();
        assert_eq!(output.stdout, "a.xls a.xml");
        assert!(output.stderr.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_reported() {
        let runner = SystemProcessRunner::new(Duration::from_millis(200));
        let cmd = ToolCommand::new("sleep", &["5"]);
        let started = std::time::Instant::now();
        let err = runner.run(&cmd, &[]).await.unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let runner = SystemProcessRunner::new(Duration::from_secs(1));
        let cmd = ToolCommand::new("no-such-tool-for-xform-tests", &[]);
        let err = runner.run(&cmd, &[]).await.unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }
}
