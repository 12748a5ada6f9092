// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Errors from timed subprocess execution.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{description} failed: {source}")]
    Io {
        description: String,
        source: std::io::Error,
    },
    #[error("{description} timed out after {}s", timeout.as_secs())]
    Timeout {
        description: String,
        timeout: Duration,
    },
}

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`. The child process
/// is killed automatically if the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, ExecError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(ExecError::Io {
            description: description.to_string(),
            source,
        }),
        Err(_elapsed) => Err(ExecError::Timeout {
            description: description.to_string(),
            timeout,
        }),
    }
}

/// Run a subprocess with `input` piped to its stdin, under a timeout.
///
/// Stdin is closed after the write so line-oriented tools see EOF. The
/// child is killed if the deadline elapses.
pub async fn run_with_stdin(
    mut cmd: Command,
    input: &str,
    timeout: Duration,
    description: &str,
) -> Result<Output, ExecError> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let io_err = |source| ExecError::Io {
        description: description.to_string(),
        source,
    };

    let mut child = cmd.spawn().map_err(io_err)?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).await.map_err(io_err)?;
        // Dropping the handle closes the pipe.
    }

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(ExecError::Io {
            description: description.to_string(),
            source,
        }),
        Err(_elapsed) => Err(ExecError::Timeout {
            description: description.to_string(),
            timeout,
        }),
    }
}

/// Last ~500 chars of stderr, for error messages.
pub fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.len() <= 500 {
        trimmed.to_string()
    } else {
        let start = trimmed.len() - 500;
        // Avoid slicing inside a UTF-8 sequence.
        let boundary = (start..trimmed.len())
            .find(|&i| trimmed.is_char_boundary(i))
            .unwrap_or(trimmed.len());
        trimmed[boundary..].to_string()
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
