// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-edit linter hook with an auto-fix loop.
//!
//! After a file edit, runs the enabled linters over the file. If issues are
//! found and auto-fix is on, a fix agent is invoked under an `agents` pool
//! permit with a complexity-scaled deadline, then the linters run again,
//! up to `max_iterations` times. The permit is held only across the agent
//! call, never across linter runs. This hook annotates and repairs; it
//! never vetoes the host operation.

use crate::hook::{base_config_schema, Hook, HookContext, HookError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};
use warden_core::{short_id, Decision, EventType, HookEvent};
use warden_tools::{run_with_stdin, run_with_timeout, stderr_tail, ExecError};

/// Tools whose successful completion means a file may have changed.
const EDIT_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit", "NotebookEdit"];

/// Pool drawn on for fix-agent runs.
const AGENTS_POOL: &str = "agents";

/// Name of the probed fix-agent tool.
const FIX_AGENT: &str = "fix-agent";

const REPORT_MAX_LINES: usize = 10;
const REPORT_MAX_CHARS: usize = 500;
const FIX_TIMEOUT_FLOOR: Duration = Duration::from_secs(60);
const FIX_TIMEOUT_CEILING: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    pub enabled: bool,
    /// Linters to run, in order. Known: black, isort, flake8, mypy, pyright.
    pub enabled_linters: Vec<String>,
    pub auto_fix: bool,
    pub max_iterations: u32,
    /// File extensions this hook lints.
    pub extensions: Vec<String>,
    /// How long to wait for an `agents` permit before skipping auto-fix.
    pub agent_wait_seconds: u64,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enabled_linters: vec![
                "black".to_string(),
                "flake8".to_string(),
                "pyright".to_string(),
            ],
            auto_fix: true,
            max_iterations: 3,
            extensions: vec![".py".to_string()],
            agent_wait_seconds: 600,
        }
    }
}

pub struct LintHook {
    config: LintConfig,
    ctx: HookContext,
}

impl LintHook {
    pub fn from_config(config: LintConfig, ctx: HookContext) -> Self {
        Self { config, ctx }
    }

    fn should_process(&self, file_path: &str) -> bool {
        let recognized = self
            .config
            .extensions
            .iter()
            .any(|ext| file_path.ends_with(ext.as_str()));
        recognized && !in_config_tree(file_path)
    }

    /// Run every enabled linter in config order; returns pass/fail and the
    /// combined report.
    async fn run_linters(&self, file_path: &str) -> (bool, String) {
        let mut issues: Vec<String> = Vec::new();
        for linter in &self.config.enabled_linters {
            if let Some(report) = self.run_linter(linter, file_path).await {
                issues.push(report);
            }
        }
        (issues.is_empty(), issues.join("\n\n"))
    }

    async fn run_linter(&self, linter: &str, file_path: &str) -> Option<String> {
        let (program, args, label, report_stream) = match linter {
            "black" => ("black", vec!["--check", file_path], "Black (formatting)", Stream::Stderr),
            "isort" => ("isort", vec!["--check", file_path], "isort (import order)", Stream::Stderr),
            "flake8" => ("flake8", vec![file_path], "Flake8 (style)", Stream::Stdout),
            "mypy" => ("mypy", vec!["--strict", file_path], "MyPy (type checking)", Stream::Stdout),
            "pyright" => return self.run_pyright(file_path).await,
            other => {
                warn!(linter = other, "unknown linter in config, skipping");
                return None;
            }
        };

        let mut cmd = Command::new(program);
        cmd.args(&args);
        match run_with_timeout(cmd, self.ctx.timeouts.linter, program).await {
            Ok(output) if output.status.success() => None,
            Ok(output) => {
                let text = match report_stream {
                    Stream::Stdout => String::from_utf8_lossy(&output.stdout).trim().to_string(),
                    Stream::Stderr => String::from_utf8_lossy(&output.stderr).trim().to_string(),
                };
                Some(match report_stream {
                    Stream::Stdout => format!("{label}:\n{text}"),
                    Stream::Stderr => format!("{label}: {text}"),
                })
            }
            Err(e @ ExecError::Timeout { .. }) => Some(format!("{label}: {e}")),
            Err(ExecError::Io { source, .. }) => {
                // Linter binary missing or unrunnable: skip it.
                debug!(linter, error = %source, "linter unavailable, skipping");
                None
            }
        }
    }

    async fn run_pyright(&self, file_path: &str) -> Option<String> {
        let mut cmd = Command::new("pyright");
        cmd.arg(file_path);
        match run_with_timeout(cmd, self.ctx.timeouts.linter, "pyright").await {
            Ok(output) if output.status.success() => None,
            Ok(output) => {
                let combined = format!(
                    "{}{}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                );
                if combined.contains("0 errors") {
                    return None;
                }
                let errors = parse_pyright_output(&combined);
                (!errors.is_empty()).then(|| format!("Pyright:\n{}", errors))
            }
            Err(e @ ExecError::Timeout { .. }) => Some(format!("Pyright: {e}")),
            Err(ExecError::Io { source, .. }) => {
                debug!(linter = "pyright", error = %source, "linter unavailable, skipping");
                None
            }
        }
    }

    /// The S2 fix loop: permit → agent call → release → re-lint.
    async fn auto_fix(&self, file_path: &str, mut report: String) -> Decision {
        let operation_id = short_id();
        for iteration in 1..=self.config.max_iterations {
            let deadline = self.ctx.timeouts.for_fix_agent(
                complexity_factor(&report),
                FIX_TIMEOUT_FLOOR,
                FIX_TIMEOUT_CEILING,
            );
            info!(
                file = file_path,
                iteration,
                max = self.config.max_iterations,
                timeout_secs = deadline.as_secs(),
                operation_id,
                "running fix agent"
            );

            let mut metadata = HashMap::new();
            metadata.insert("file_path".to_string(), serde_json::json!(file_path));
            metadata.insert("hook".to_string(), serde_json::json!("post_tool_linter"));
            metadata.insert("operation_id".to_string(), serde_json::json!(operation_id));

            let permit = self
                .ctx
                .pool
                .acquire(
                    AGENTS_POOL,
                    metadata,
                    Some(Duration::from_secs(self.config.agent_wait_seconds)),
                )
                .await;
            if !permit.acquired() {
                return Decision::allow(format!(
                    "⏸ {file_path} — resource busy, auto-fix skipped"
                ));
            }
            let result = self.invoke_fix_agent(file_path, &report, deadline).await;
            drop(permit);

            if let Err(reason) = result {
                return Decision::allow(format!("✗ {file_path} — {reason}"));
            }

            let (clean, remaining) = self.run_linters(file_path).await;
            if clean {
                return Decision::allow(format!("✓ {file_path} — all issues fixed"));
            }
            debug!(file = file_path, iteration, "issues remain after fix attempt");
            report = remaining;
        }

        Decision::allow(format!(
            "⚠ {file_path} — issues remain after {} auto-fix attempts:\n{}",
            self.config.max_iterations,
            truncate_report(&report)
        ))
    }

    async fn invoke_fix_agent(
        &self,
        file_path: &str,
        report: &str,
        deadline: Duration,
    ) -> Result<(), String> {
        let invocation = self
            .ctx
            .tools
            .invocation(FIX_AGENT)
            .ok_or_else(|| "fix agent not available".to_string())?;

        let mut cmd = Command::new(&invocation.command);
        cmd.args(&invocation.args);
        cmd.args([
            "--dangerously-skip-permissions",
            "--output-format",
            "stream-json",
            "--verbose",
            "-p",
            "-",
        ]);

        let prompt = fix_prompt(file_path, report);
        match run_with_stdin(cmd, &prompt, deadline, "fix agent").await {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if stdout.trim().is_empty() || stdout.to_lowercase().contains("no changes needed")
                {
                    Err("auto-fix failed: fix agent made no changes".to_string())
                } else {
                    Ok(())
                }
            }
            Ok(output) => Err(format!(
                "auto-fix failed: fix agent exited with {}: {}",
                output.status.code().unwrap_or(-1),
                stderr_tail(&output)
            )),
            Err(ExecError::Timeout { .. }) => Err("auto-fix timed out".to_string()),
            Err(ExecError::Io { source, .. }) => Err(format!("auto-fix failed: {source}")),
        }
    }
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn in_config_tree(file_path: &str) -> bool {
    file_path.contains("/.claude/") || file_path.contains("/.warden/")
}

/// Keep ` - error: ` lines and the closing summary line, capped at 10.
fn parse_pyright_output(output: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in output.lines() {
        if line.contains(" - error: ") {
            lines.push(line.trim().to_string());
        } else if line.contains("error") && line.contains("warning") && line.contains("information")
        {
            lines.push(format!("Summary: {}", line.trim()));
        }
    }
    if lines.len() > REPORT_MAX_LINES {
        let extra = lines.len() - REPORT_MAX_LINES;
        lines.truncate(REPORT_MAX_LINES);
        lines.push(format!("... and {extra} more errors"));
    }
    lines.join("\n")
}

/// First 10 lines and at most ~500 chars of a report, for user-facing
/// messages.
fn truncate_report(report: &str) -> String {
    let mut text = report
        .lines()
        .take(REPORT_MAX_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    if text.chars().count() > REPORT_MAX_CHARS {
        text = text.chars().take(REPORT_MAX_CHARS).collect();
        text.push('…');
    }
    text
}

/// `base × (1 + 0.2 · estimated_issues)` where the estimate is one issue
/// per three report lines.
fn complexity_factor(report: &str) -> f64 {
    let estimated_issues = (report.lines().count() / 3).max(1);
    1.0 + 0.2 * estimated_issues as f64
}

fn fix_prompt(file_path: &str, report: &str) -> String {
    format!(
        "Fix ALL linting and type errors in {file_path}\n\n\
         Current issues that MUST be fixed:\n{report}\n\n\
         Instructions:\n\
         1. Use Edit or MultiEdit to fix ALL issues listed above\n\
         2. If needed to resolve type errors, you may modify other imported files\n\
         3. Do not just say the file looks good - actually fix every issue listed\n\
         \n\
         The goal is a clean report from every linter."
    )
}

#[async_trait]
impl Hook for LintHook {
    fn name(&self) -> &str {
        "post_tool_linter"
    }

    fn is_applicable(&self, event: &HookEvent) -> bool {
        self.config.enabled
            && event.event_type == EventType::PostToolUse
            && EDIT_TOOLS.contains(&event.tool_name.as_str())
    }

    async fn process_event(&self, event: &HookEvent) -> Result<Decision, HookError> {
        if !self.is_applicable(event) {
            return Ok(Decision::silent());
        }
        let Some(file_path) = event.file_path().map(str::to_string) else {
            return Ok(Decision::silent());
        };
        if !self.should_process(&file_path) {
            return Ok(Decision::silent());
        }

        let (clean, report) = self.run_linters(&file_path).await;
        if clean {
            return Ok(Decision::allow(format!(
                "✓ {file_path} — no linting issues"
            )));
        }

        if !self.config.auto_fix {
            return Ok(Decision::allow(format!(
                "⚠ {file_path} has linting issues:\n{}",
                truncate_report(&report)
            )));
        }
        if !self.ctx.tools.is_available(FIX_AGENT) {
            return Ok(Decision::allow(format!(
                "⚠ {file_path} has linting issues (fix agent unavailable):\n{}",
                truncate_report(&report)
            )));
        }

        Ok(self.auto_fix(&file_path, report).await)
    }

    fn config_schema(&self) -> serde_json::Value {
        let mut schema = base_config_schema();
        if let Some(properties) = schema
            .get_mut("properties")
            .and_then(|p| p.as_object_mut())
        {
            properties.insert(
                "enabled_linters".to_string(),
                serde_json::json!({
                    "type": "array",
                    "items": {
                        "type": "string",
                        "enum": ["black", "flake8", "mypy", "pyright", "isort"],
                    },
                    "default": ["black", "flake8", "pyright"],
                    "description": "Linters to run",
                }),
            );
            properties.insert(
                "auto_fix".to_string(),
                serde_json::json!({
                    "type": "boolean",
                    "default": true,
                    "description": "Automatically fix linting issues",
                }),
            );
            properties.insert(
                "max_iterations".to_string(),
                serde_json::json!({
                    "type": "integer",
                    "default": 3,
                    "minimum": 1,
                    "maximum": 10,
                    "description": "Maximum auto-fix attempts",
                }),
            );
        }
        schema
    }
}

#[cfg(test)]
#[path = "lint_tests.rs"]
mod tests;
