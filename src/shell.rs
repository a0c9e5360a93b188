//! Shell command execution.
//!
//! Everything `bwd` does to the outside world (docker, ssh, scp, zip) is a
//! shell string handed to a [`CommandRunner`]. [`ShellRunner`] spawns
//! `sh -c`; [`RecordingRunner`] records the strings and replays canned
//! output so the orchestration can be tested without those binaries.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::BwdError;

pub trait CommandRunner {
    /// Run `cmd` and return its stdout. A non-zero exit is an error.
    fn capture(&self, cmd: &str) -> Result<String>;

    /// Run `cmd` attached to the terminal and return its exit code.
    fn stream(&self, cmd: &str) -> Result<i32>;

    /// [`stream`](Self::stream), treating a non-zero exit as an error.
    fn stream_checked(&self, cmd: &str) -> Result<()> {
        let code = self.stream(cmd)?;
        if code != 0 {
            return Err(BwdError::CommandFailed {
                command: cmd.to_string(),
                code: Some(code),
                stderr: String::new(),
            }
            .into());
        }
        Ok(())
    }
}

pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn capture(&self, cmd: &str) -> Result<String> {
        debug!(%cmd, "capture");
        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .output()
            .context("failed to invoke `sh`")?;

        if !output.status.success() {
            return Err(BwdError::CommandFailed {
                command: cmd.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn stream(&self, cmd: &str) -> Result<i32> {
        debug!(%cmd, "stream");
        let status = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .status()
            .context("failed to invoke `sh`")?;
        // Killed by a signal: report the conventional 128 + n where possible.
        Ok(status.code().unwrap_or_else(|| signal_exit_code(&status)))
    }
}

#[cfg(unix)]
fn signal_exit_code(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map_or(1, |sig| 128 + sig)
}

#[cfg(not(unix))]
fn signal_exit_code(_status: &std::process::ExitStatus) -> i32 {
    1
}

/// Test double: records every command and answers `capture` from a queue.
#[derive(Default)]
pub struct RecordingRunner {
    outputs: RefCell<VecDeque<String>>,
    commands: RefCell<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue stdout for the next `capture` calls, in order. Once drained,
    /// `capture` returns an empty string.
    pub fn with_outputs<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            outputs: RefCell::new(outputs.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Fail the first command containing `needle`.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    fn record(&self, cmd: &str) -> Result<()> {
        self.commands.borrow_mut().push(cmd.to_string());
        if let Some(needle) = &self.fail_on
            && cmd.contains(needle.as_str())
        {
            return Err(BwdError::CommandFailed {
                command: cmd.to_string(),
                code: Some(1),
                stderr: String::new(),
            }
            .into());
        }
        Ok(())
    }
}

impl CommandRunner for RecordingRunner {
    fn capture(&self, cmd: &str) -> Result<String> {
        self.record(cmd)?;
        Ok(self.outputs.borrow_mut().pop_front().unwrap_or_default())
    }

    fn stream(&self, cmd: &str) -> Result<i32> {
        self.record(cmd)?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_runner_captures_stdout() {
        let out = ShellRunner.capture("printf hello").unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn shell_runner_reports_failure_with_stderr() {
        let err = ShellRunner.capture("echo oops >&2; exit 3").unwrap_err();
        match err.downcast_ref::<BwdError>() {
            Some(BwdError::CommandFailed { code, stderr, .. }) => {
                assert_eq!(*code, Some(3));
                assert_eq!(stderr.trim(), "oops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn shell_runner_stream_returns_exit_code() {
        assert_eq!(ShellRunner.stream("exit 0").unwrap(), 0);
        assert_eq!(ShellRunner.stream("exit 7").unwrap(), 7);
    }

    #[test]
    fn stream_checked_rejects_non_zero() {
        assert!(ShellRunner.stream_checked("true").is_ok());
        assert!(ShellRunner.stream_checked("false").is_err());
    }

    #[test]
    fn recording_runner_replays_outputs_in_order() {
        let runner = RecordingRunner::with_outputs(["a", "b"]);
        assert_eq!(runner.capture("one").unwrap(), "a");
        assert_eq!(runner.stream("two").unwrap(), 0);
        assert_eq!(runner.capture("three").unwrap(), "b");
        assert_eq!(runner.capture("four").unwrap(), "");
        assert_eq!(runner.commands(), ["one", "two", "three", "four"]);
    }

    #[test]
    fn recording_runner_fails_on_match() {
        let runner = RecordingRunner::new().failing_on("scp");
        assert!(runner.capture("ssh host true").is_ok());
        assert!(runner.capture("scp a host:b").is_err());
        assert_eq!(runner.commands().len(), 2);
    }
}
