// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External tool invocation.
//!
//! Most utilities are thin front-ends to some other program, e.g., qpdf, sox,
//! youtube-dl, gsettings, pactl. All of them reach those programs through the
//! [`Syscall`] trait so that callers can swap out the real process spawner for
//! one that merely records what would have been run.

use std::{
    ffi::{OsStr, OsString},
    io::Write,
    process::{Command, Stdio},
};
use tracing::{debug, instrument};

/// Invoke external programs.
pub trait Syscall {
    /// Run command with inherited stdio, blocking until it exits.
    ///
    /// # Errors
    ///
    /// - Return [`SyscallError::Spawn`] if command cannot be started.
    /// - Return [`SyscallError::Failed`] if command exits unsuccessfully.
    fn interactive(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<()>;

    /// Run command and collect its stdout and stderr as a single message.
    ///
    /// # Errors
    ///
    /// - Return [`SyscallError::Spawn`] if command cannot be started.
    /// - Return [`SyscallError::Failed`] if command exits unsuccessfully.
    fn non_interactive(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<String>;

    /// Run command and return its raw stdout.
    ///
    /// # Errors
    ///
    /// - Return [`SyscallError::Spawn`] if command cannot be started.
    /// - Return [`SyscallError::Failed`] if command exits unsuccessfully.
    fn capture(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<Vec<u8>>;

    /// Run command with given input fed through its stdin.
    ///
    /// # Errors
    ///
    /// - Return [`SyscallError::Spawn`] if command cannot be started.
    /// - Return [`SyscallError::Failed`] if command exits unsuccessfully.
    fn piped(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
        input: &str,
    ) -> Result<String>;
}

/// Spawn real processes on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct System;

impl Syscall for System {
    #[instrument(skip(self, cmd, args), level = "debug")]
    fn interactive(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<()> {
        let mut command = Command::new(cmd.as_ref());
        command.args(args);
        debug!("run {command:?}");

        let status = command
            .spawn()
            .map_err(|err| spawn_error(cmd.as_ref(), err))?
            .wait()
            .map_err(|err| spawn_error(cmd.as_ref(), err))?;
        if !status.success() {
            return Err(SyscallError::Failed {
                cmd: cmd.as_ref().to_os_string(),
                message: status.to_string(),
            });
        }

        Ok(())
    }

    #[instrument(skip(self, cmd, args), level = "debug")]
    fn non_interactive(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<String> {
        let mut command = Command::new(cmd.as_ref());
        command.args(args);
        debug!("run {command:?}");

        let output = command
            .output()
            .map_err(|err| spawn_error(cmd.as_ref(), err))?;
        let message = join_output(&output.stdout, &output.stderr);
        if !output.status.success() {
            return Err(SyscallError::Failed {
                cmd: cmd.as_ref().to_os_string(),
                message,
            });
        }

        Ok(message)
    }

    #[instrument(skip(self, cmd, args), level = "debug")]
    fn capture(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<Vec<u8>> {
        let mut command = Command::new(cmd.as_ref());
        command.args(args).stderr(Stdio::inherit());
        debug!("run {command:?}");

        let output = command
            .output()
            .map_err(|err| spawn_error(cmd.as_ref(), err))?;
        if !output.status.success() {
            return Err(SyscallError::Failed {
                cmd: cmd.as_ref().to_os_string(),
                message: output.status.to_string(),
            });
        }

        Ok(output.stdout)
    }

    #[instrument(skip(self, cmd, args, input), level = "debug")]
    fn piped(
        &self,
        cmd: impl AsRef<OsStr>,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
        input: &str,
    ) -> Result<String> {
        let mut command = Command::new(cmd.as_ref());
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!("run {command:?}");

        let mut child = command
            .spawn()
            .map_err(|err| spawn_error(cmd.as_ref(), err))?;

        // INVARIANT: Drop stdin handle before waiting so the child sees EOF.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .map_err(|err| spawn_error(cmd.as_ref(), err))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|err| spawn_error(cmd.as_ref(), err))?;
        let message = join_output(&output.stdout, &output.stderr);
        if !output.status.success() {
            return Err(SyscallError::Failed {
                cmd: cmd.as_ref().to_os_string(),
                message,
            });
        }

        Ok(message)
    }
}

fn spawn_error(cmd: &OsStr, source: std::io::Error) -> SyscallError {
    SyscallError::Spawn {
        cmd: cmd.to_os_string(),
        source,
    }
}

fn join_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(stdout.as_ref());
    }

    if !stderr.is_empty() {
        message.push_str(stderr.as_ref());
    }

    // INVARIANT: Chomp trailing newlines.
    message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message)
}

/// External tool invocation error types.
#[derive(Debug, thiserror::Error)]
pub enum SyscallError {
    /// Command could not be started, e.g., binary is not installed.
    #[error("failed to run {cmd:?}")]
    Spawn {
        cmd: OsString,
        #[source]
        source: std::io::Error,
    },

    /// Command ran but exited unsuccessfully.
    #[error("command {cmd:?} failed: {message}")]
    Failed { cmd: OsString, message: String },
}

/// Friendly result alias :3
pub type Result<T, E = SyscallError> = std::result::Result<T, E>;


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn non_interactive_chomps_output() -> anyhow::Result<()> {
        let result = System.non_interactive("echo", ["hello", "world"])?;
        assert_eq!(result, "hello world");
        Ok(())
    }

    #[test]
    fn non_interactive_reports_failure() {
        let result = System.non_interactive("false", std::iter::empty::<&str>());
        assert!(matches!(result, Err(SyscallError::Failed { .. })));
    }

    #[test]
    fn missing_binary_reports_spawn_error() {
        let result = System.non_interactive("toolbelt-no-such-binary", ["--help"]);
        assert!(matches!(result, Err(SyscallError::Spawn { .. })));
    }

    #[test]
    fn piped_feeds_stdin() -> anyhow::Result<()> {
        let result = System.piped("cat", std::iter::empty::<&str>(), "fed through stdin\n")?;
        assert_eq!(result, "fed through stdin");
        Ok(())
    }

    #[test]
    fn capture_keeps_raw_bytes() -> anyhow::Result<()> {
        let result = System.capture("printf", ["a\\nb\\n"])?;
        assert_eq!(result, b"a\nb\n".to_vec());
        Ok(())
    }
}
