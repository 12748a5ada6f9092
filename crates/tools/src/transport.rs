// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport-aware tool invocation.
//!
//! Three ways to reach an external tool, selected by the probed
//! [`Invocation`]: a plain subprocess fed JSON on stdin, an HTTP JSON-RPC
//! endpoint, or a stdio JSON-RPC child that requires the three-step MCP
//! handshake. No transport retries internally.

use crate::probe::{Invocation, Transport};
use crate::rpc;
use crate::subprocess::{run_with_stdin, stderr_tail, ExecError};
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, warn};

/// Uniform error taxonomy shared by all transports.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("i/o error talking to tool: {0}")]
    Io(#[from] std::io::Error),
    #[error("tool call timed out after {}s", timeout.as_secs())]
    Timeout { timeout: Duration },
    #[error("tool exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },
    #[error("http status {status}")]
    HttpStatus { status: u16 },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed json response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tool produced no response")]
    NoResponse,
    #[error("invocation not usable: {0}")]
    Unavailable(String),
}

/// Invoke a tool with a JSON request, dispatching on the probed transport.
pub async fn invoke(
    invocation: &Invocation,
    request: &Value,
    timeout: Duration,
) -> Result<Value, TransportError> {
    match invocation.transport {
        Transport::Subprocess => invoke_subprocess(invocation, request, timeout).await,
        Transport::Http => invoke_http(invocation, request, timeout).await,
        Transport::Stdio => invoke_stdio(invocation, request, timeout).await,
    }
}

/// Plain subprocess: request JSON on stdin, response JSON on stdout.
pub async fn invoke_subprocess(
    invocation: &Invocation,
    request: &Value,
    timeout: Duration,
) -> Result<Value, TransportError> {
    let mut cmd = Command::new(&invocation.command);
    cmd.args(&invocation.args);

    let output = run_with_stdin(cmd, &request.to_string(), timeout, &invocation.command)
        .await
        .map_err(|e| match e {
            ExecError::Timeout { timeout, .. } => TransportError::Timeout { timeout },
            ExecError::Io { source, .. } => TransportError::Io(source),
        })?;

    if !output.status.success() {
        return Err(TransportError::Failed {
            status: output.status.code().unwrap_or(-1),
            stderr: stderr_tail(&output),
        });
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(serde_json::from_str(stdout.trim())?)
}

/// HTTP JSON-RPC: POST the envelope, expect a 200 with a JSON body.
pub async fn invoke_http(
    invocation: &Invocation,
    request: &Value,
    timeout: Duration,
) -> Result<Value, TransportError> {
    let url = invocation
        .url
        .as_deref()
        .ok_or_else(|| TransportError::Unavailable("no url for http transport".to_string()))?;

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .header("Accept", "application/json, text/event-stream")
        .json(request)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { timeout }
            } else {
                TransportError::Http(e)
            }
        })?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(TransportError::HttpStatus {
            status: status.as_u16(),
        });
    }
    Ok(response.json().await?)
}

/// Stdio JSON-RPC with the three-step MCP handshake.
///
/// The child is spawned with `--transport stdio` appended; the dispatcher
/// writes `initialize`, `notifications/initialized`, then the caller's
/// request, reading one response line after the first and third writes.
/// Every failure path kills and reaps the child.
pub async fn invoke_stdio(
    invocation: &Invocation,
    request: &Value,
    timeout: Duration,
) -> Result<Value, TransportError> {
    let mut cmd = Command::new(&invocation.command);
    cmd.args(&invocation.args)
        .arg("--transport")
        .arg("stdio")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| TransportError::Spawn {
        command: invocation.command.clone(),
        source,
    })?;

    match handshake(&mut child, request, timeout).await {
        Ok(response) => {
            // Stdin is closed by the handshake; give the child its bounded
            // wait before parsing.
            if tokio::time::timeout(timeout, child.wait()).await.is_err() {
                kill_and_reap(&mut child).await;
            }
            Ok(serde_json::from_str(response.trim())?)
        }
        Err(e) => {
            kill_and_reap(&mut child).await;
            Err(e)
        }
    }
}

async fn handshake(
    child: &mut Child,
    request: &Value,
    timeout: Duration,
) -> Result<String, TransportError> {
    let mut stdin = child.stdin.take().ok_or(TransportError::NoResponse)?;
    let stdout = child.stdout.take().ok_or(TransportError::NoResponse)?;
    let mut lines = BufReader::new(stdout).lines();

    // Step 1: initialize, read and discard the server's answer.
    write_line(&mut stdin, &rpc::initialize()).await?;
    let init_response = read_line(&mut lines, timeout).await?;
    debug!(response = %truncate_for_log(&init_response), "initialize answered");

    // Step 2: initialized notification, nothing comes back.
    write_line(&mut stdin, &rpc::notification("notifications/initialized")).await?;

    // Step 3: the caller's actual request.
    write_line(&mut stdin, request).await?;
    let response = read_line(&mut lines, timeout).await?;

    // Closing stdin lets the child exit.
    drop(stdin);
    Ok(response)
}

async fn write_line(stdin: &mut ChildStdin, message: &Value) -> Result<(), TransportError> {
    let mut line = message.to_string();
    line.push('\n');
    stdin.write_all(line.as_bytes()).await?;
    stdin.flush().await?;
    Ok(())
}

async fn read_line(
    lines: &mut tokio::io::Lines<BufReader<tokio::process::ChildStdout>>,
    timeout: Duration,
) -> Result<String, TransportError> {
    match tokio::time::timeout(timeout, lines.next_line()).await {
        Ok(Ok(Some(line))) => Ok(line),
        Ok(Ok(None)) => Err(TransportError::NoResponse),
        Ok(Err(source)) => Err(TransportError::Io(source)),
        Err(_elapsed) => Err(TransportError::Timeout { timeout }),
    }
}

async fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill stdio tool child");
    }
    if let Err(e) = child.wait().await {
        warn!(error = %e, "failed to reap stdio tool child");
    }
}

fn truncate_for_log(s: &str) -> &str {
    let end = s
        .char_indices()
        .take_while(|(i, _)| *i < 200)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &s[..end]
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
