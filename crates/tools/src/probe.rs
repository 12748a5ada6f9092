// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External tool availability probing.
//!
//! At startup each known tool is probed in search order — local package
//! install, submodule checkout, global command, configured remote endpoint.
//! The first candidate that answers a cheap version/help invocation wins,
//! and the resulting recipe is treated as read-only for the rest of the
//! process lifetime.

use crate::subprocess::{run_with_stdin, run_with_timeout, ExecError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// How a probed tool is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Subprocess,
    Stdio,
    Http,
}

/// Where a tool was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Local,
    Submodule,
    Global,
    Remote,
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolKind::Local => write!(f, "local"),
            ToolKind::Submodule => write!(f, "submodule"),
            ToolKind::Global => write!(f, "global"),
            ToolKind::Remote => write!(f, "remote"),
        }
    }
}

/// The recipe for invoking a probed tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub transport: Transport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One place a tool might be installed.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub kind: ToolKind,
    /// Command to execute (absolute path for local/submodule candidates).
    pub command: String,
    /// Fixed arguments that are part of the invocation, e.g. a script path
    /// after `node`.
    pub args: Vec<String>,
    /// Arguments for the availability check, e.g. `--version`.
    pub probe_args: Vec<String>,
    /// Path that must exist before the candidate is even tried.
    pub requires_path: Option<PathBuf>,
    /// Accept a nonzero exit if stdout contains a `{` — some CLIs answer
    /// help-with-no-args on stdout but exit nonzero.
    pub accept_json_marker: bool,
    /// Transport used when invoking the tool through this candidate.
    pub transport: Transport,
}

/// A tool the dispatcher knows how to look for.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub candidates: Vec<Candidate>,
    /// Remote endpoint used when no local candidate answers.
    pub remote_url: Option<String>,
}

impl ToolSpec {
    /// The validation CLI: local npm install, then submodule, then PATH.
    pub fn tdd_guard(project_root: &Path) -> Self {
        let local_bin = project_root.join("node_modules/.bin/tdd-guard");
        let submodule_js = project_root.join("external/tdd-guard/dist/cli/tdd-guard.js");
        Self {
            name: "tdd-guard".to_string(),
            candidates: vec![
                Candidate {
                    kind: ToolKind::Local,
                    command: local_bin.display().to_string(),
                    args: Vec::new(),
                    probe_args: vec!["--version".to_string()],
                    requires_path: Some(local_bin),
                    accept_json_marker: true,
                    transport: Transport::Subprocess,
                },
                Candidate {
                    kind: ToolKind::Submodule,
                    command: "node".to_string(),
                    args: vec![submodule_js.display().to_string()],
                    probe_args: vec!["--version".to_string()],
                    requires_path: Some(submodule_js),
                    accept_json_marker: false,
                    transport: Transport::Subprocess,
                },
                Candidate {
                    kind: ToolKind::Global,
                    command: "tdd-guard".to_string(),
                    args: Vec::new(),
                    probe_args: vec!["--version".to_string()],
                    requires_path: None,
                    accept_json_marker: false,
                    transport: Transport::Subprocess,
                },
            ],
            remote_url: None,
        }
    }

    /// The documentation MCP server: npx package, then submodule, then a
    /// configured remote HTTP endpoint.
    pub fn context7(project_root: &Path, remote_url: Option<String>) -> Self {
        let submodule_js = project_root.join("external/context7-mcp/dist/index.js");
        Self {
            name: "context7".to_string(),
            candidates: vec![
                Candidate {
                    kind: ToolKind::Local,
                    command: "npx".to_string(),
                    args: vec!["--yes".to_string(), "@upstash/context7-mcp".to_string()],
                    probe_args: vec!["--help".to_string()],
                    requires_path: None,
                    accept_json_marker: false,
                    transport: Transport::Stdio,
                },
                Candidate {
                    kind: ToolKind::Submodule,
                    command: "node".to_string(),
                    args: vec![submodule_js.display().to_string()],
                    probe_args: vec!["--help".to_string()],
                    requires_path: Some(submodule_js),
                    accept_json_marker: false,
                    transport: Transport::Stdio,
                },
            ],
            remote_url,
        }
    }

    /// The auto-fix agent CLI.
    pub fn fix_agent() -> Self {
        let home_bin = dirs_home().join(".local/bin/claude");
        Self {
            name: "fix-agent".to_string(),
            candidates: vec![
                Candidate {
                    kind: ToolKind::Local,
                    command: home_bin.display().to_string(),
                    args: Vec::new(),
                    probe_args: vec!["--version".to_string()],
                    requires_path: Some(home_bin),
                    accept_json_marker: false,
                    transport: Transport::Subprocess,
                },
                Candidate {
                    kind: ToolKind::Local,
                    command: "/usr/local/bin/claude".to_string(),
                    args: Vec::new(),
                    probe_args: vec!["--version".to_string()],
                    requires_path: Some(PathBuf::from("/usr/local/bin/claude")),
                    accept_json_marker: false,
                    transport: Transport::Subprocess,
                },
                Candidate {
                    kind: ToolKind::Global,
                    command: "claude".to_string(),
                    args: Vec::new(),
                    probe_args: vec!["--version".to_string()],
                    requires_path: None,
                    accept_json_marker: false,
                    transport: Transport::Subprocess,
                },
            ],
            remote_url: None,
        }
    }
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Result of probing one tool. Immutable after the initial probe.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ToolKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation: Option<Invocation>,
    /// Human-readable reason when unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ToolStatus {
    fn unavailable(name: &str, reason: String) -> Self {
        Self {
            name: name.to_string(),
            available: false,
            kind: None,
            path: None,
            version: None,
            invocation: None,
            reason: Some(reason),
        }
    }
}

/// Probed availability of every known tool.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: BTreeMap<String, ToolStatus>,
}

impl ToolCatalog {
    /// Probe each spec in order and build the catalog.
    pub async fn probe(specs: Vec<ToolSpec>, check_timeout: Duration) -> Self {
        let mut tools = BTreeMap::new();
        for spec in specs {
            let status = probe_tool(&spec, check_timeout).await;
            if status.available {
                info!(tool = %status.name, kind = ?status.kind,
                    version = status.version.as_deref().unwrap_or(""), "tool available");
            } else {
                warn!(tool = %status.name,
                    reason = status.reason.as_deref().unwrap_or(""), "tool not available");
            }
            tools.insert(status.name.clone(), status);
        }
        Self { tools }
    }

    /// A catalog with explicit statuses, for tests and embedders.
    pub fn from_statuses(statuses: Vec<ToolStatus>) -> Self {
        Self {
            tools: statuses
                .into_iter()
                .map(|status| (status.name.clone(), status))
                .collect(),
        }
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.tools.get(name).is_some_and(|status| status.available)
    }

    pub fn get(&self, name: &str) -> Option<&ToolStatus> {
        self.tools.get(name)
    }

    pub fn invocation(&self, name: &str) -> Option<&Invocation> {
        self.tools.get(name).and_then(|s| s.invocation.as_ref())
    }

    /// Human-readable status report.
    pub fn report(&self) -> String {
        let mut lines = vec!["External tools:".to_string()];
        for status in self.tools.values() {
            if status.available {
                let source = status
                    .kind
                    .map(|kind| kind.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let version = status
                    .version
                    .as_deref()
                    .map(|v| format!(" ({v})"))
                    .unwrap_or_default();
                lines.push(format!("  ✓ {}: available from {}{}", status.name, source, version));
            } else {
                let reason = status.reason.as_deref().unwrap_or("unknown reason");
                lines.push(format!("  ✗ {}: {}", status.name, reason));
            }
        }
        lines.join("\n")
    }
}

async fn probe_tool(spec: &ToolSpec, check_timeout: Duration) -> ToolStatus {
    let mut last_reason = format!("{} not found", spec.name);

    for candidate in &spec.candidates {
        if let Some(required) = &candidate.requires_path {
            if !required.exists() {
                debug!(tool = %spec.name, path = %required.display(), "candidate path absent");
                continue;
            }
        }

        match probe_candidate(candidate, check_timeout).await {
            Ok(version) => {
                return ToolStatus {
                    name: spec.name.clone(),
                    available: true,
                    kind: Some(candidate.kind),
                    path: candidate.requires_path.clone(),
                    version,
                    invocation: Some(Invocation {
                        command: candidate.command.clone(),
                        args: candidate.args.clone(),
                        transport: candidate.transport,
                        url: None,
                    }),
                    reason: None,
                };
            }
            Err(reason) => {
                debug!(tool = %spec.name, kind = %candidate.kind, reason, "candidate failed probe");
                last_reason = reason;
            }
        }
    }

    if let Some(url) = &spec.remote_url {
        return ToolStatus {
            name: spec.name.clone(),
            available: true,
            kind: Some(ToolKind::Remote),
            path: None,
            version: None,
            invocation: Some(Invocation {
                command: String::new(),
                args: Vec::new(),
                transport: Transport::Http,
                url: Some(url.clone()),
            }),
            reason: None,
        };
    }

    ToolStatus::unavailable(&spec.name, last_reason)
}

/// Run the cheap version/help invocation. Success is a clean exit, or —
/// for marker-accepting tools — any run whose stdout contains a `{`.
async fn probe_candidate(
    candidate: &Candidate,
    check_timeout: Duration,
) -> Result<Option<String>, String> {
    let mut cmd = Command::new(&candidate.command);
    cmd.args(&candidate.args);

    let description = format!("probe of {}", candidate.command);
    let output = if candidate.accept_json_marker {
        // Feed an empty request; such tools answer on stdout regardless.
        run_with_stdin(cmd, "{}", check_timeout, &description).await
    } else {
        cmd.args(&candidate.probe_args);
        run_with_timeout(cmd, check_timeout, &description).await
    };

    match output {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if output.status.success() {
                let version = stdout.trim();
                Ok((!version.is_empty()).then(|| first_line(version)))
            } else if candidate.accept_json_marker && stdout.contains('{') {
                Ok(None)
            } else {
                Err(format!(
                    "{} exited with {}",
                    candidate.command,
                    output.status.code().unwrap_or(-1)
                ))
            }
        }
        Err(e @ ExecError::Timeout { .. }) => Err(e.to_string()),
        Err(ExecError::Io { source, .. }) => {
            Err(format!("{}: {}", candidate.command, source))
        }
    }
}

fn first_line(s: &str) -> String {
    s.lines().next().unwrap_or_default().to_string()
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
