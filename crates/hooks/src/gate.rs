// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pre-edit validation gate around the external TDD validator.
//!
//! Builds a structured request for the validator CLI, runs it as a plain
//! subprocess, and translates its approve/block decision. Failure handling
//! is deliberately asymmetric: unavailability, bad exits, and unparsable
//! output always fail open, but an observed timeout in strict mode blocks
//! the operation. Preserve that asymmetry exactly.

use crate::hook::{base_config_schema, Hook, HookContext, HookError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use warden_core::{Decision, EventType, HookEvent, SessionId};

const VALIDATOR_TOOL: &str = "tdd-guard";
const GATED_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "TodoWrite"];

/// Hard ceiling on the validator call; its own agent budget lives inside.
const VALIDATOR_MAX_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub enabled: bool,
    pub strict_mode: bool,
    pub model: String,
    pub test_runner: String,
    /// Validation timeout in seconds; capped at 60 on invocation.
    pub timeout: Option<u64>,
    pub resource_pool: String,
    /// How long to wait for a `validation` permit before skipping.
    pub permit_wait_seconds: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strict_mode: false,
            model: "claude".to_string(),
            test_runner: "pytest".to_string(),
            timeout: None,
            resource_pool: "validation".to_string(),
            permit_wait_seconds: 30,
        }
    }
}

pub struct GateHook {
    config: GateConfig,
    ctx: HookContext,
}

impl GateHook {
    pub fn from_config(config: GateConfig, ctx: HookContext) -> Self {
        Self { config, ctx }
    }

    fn configured_timeout(&self) -> Duration {
        self.config
            .timeout
            .map(Duration::from_secs)
            .unwrap_or(self.ctx.timeouts.tdd_guard)
    }

    fn validation_request(&self, event: &HookEvent) -> Value {
        let session_id = event
            .session_id
            .clone()
            .map(SessionId::new)
            .unwrap_or_else(SessionId::generate);
        let transcript_path = format!("/tmp/warden_transcript_{session_id}.json");

        json!({
            "session_id": session_id.as_str(),
            "transcript_path": transcript_path,
            "hook_event_name": event.event_type.to_string(),
            "event_type": event.event_type.to_string(),
            "tool_name": event.tool_name,
            "tool_input": event.tool_input,
            "metadata": {
                "timestamp": event.timestamp(),
                "strict_mode": self.config.strict_mode,
                "model": self.config.model,
                "test_runner": self.config.test_runner,
            },
        })
    }

    /// Environment handed to the validator child. Its internal agent
    /// deadline is kept a few seconds under ours so the validator reports
    /// its own timeout instead of us killing it mid-flight.
    fn validator_env(&self) -> Vec<(String, String)> {
        let mut env = Vec::new();
        if self.config.strict_mode {
            env.push(("TDD_GUARD_STRICT".to_string(), "true".to_string()));
        }
        env.push(("TDD_GUARD_MODEL".to_string(), self.config.model.clone()));
        env.push((
            "TDD_GUARD_TEST_RUNNER".to_string(),
            self.config.test_runner.clone(),
        ));
        let inner = self
            .configured_timeout()
            .as_secs()
            .saturating_sub(5)
            .clamp(30, 55);
        env.push(("CLAUDE_TIMEOUT".to_string(), inner.to_string()));
        env
    }

    async fn validate(&self, event: &HookEvent) -> Decision {
        let Some(invocation) = self.ctx.tools.invocation(VALIDATOR_TOOL) else {
            return Decision::allow("⚠ TDD validation skipped — validator not available");
        };

        let deadline = self.configured_timeout().min(VALIDATOR_MAX_WAIT);
        let request = self.validation_request(event);
        debug!(timeout_secs = deadline.as_secs(), "running TDD validator");

        let mut cmd = tokio::process::Command::new(&invocation.command);
        cmd.args(&invocation.args)
            .envs(self.validator_env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(error = %e, "failed to spawn validator");
                return Decision::allow("⚠ TDD validation error — allowing operation");
            }
        };
        if let Some(mut stdin) = child.stdin.take() {
            if stdin.write_all(request.to_string().as_bytes()).await.is_err() {
                return Decision::allow("⚠ TDD validation error — allowing operation");
            }
        }

        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(error = %e, "validator i/o failure");
                return Decision::allow("⚠ TDD validation error — allowing operation");
            }
            Err(_elapsed) => {
                warn!(timeout_secs = deadline.as_secs(), "validator timed out");
                // The one fail-closed path: strict mode treats observable
                // unresponsiveness as a veto.
                if self.config.strict_mode {
                    return Decision::block(
                        "🛑 TDD validation timed out — blocking operation (strict mode). \
                         Try again in a moment.",
                    );
                }
                return Decision::allow("⚠ TDD validation timed out — allowing operation");
            }
        };

        if !output.status.success() {
            warn!(
                status = output.status.code().unwrap_or(-1),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "validator exited nonzero"
            );
            return Decision::allow("⚠ TDD validation error — allowing operation");
        }

        translate_response(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Translate the validator's JSON verdict into a decision. Anything other
/// than an explicit `"approve"` blocks; unparsable output fails open.
fn translate_response(stdout: &str) -> Decision {
    if stdout.trim().is_empty() {
        return Decision::silent();
    }
    let data: Value = match serde_json::from_str(stdout.trim()) {
        Ok(data) => data,
        Err(e) => {
            warn!(error = %e, "unparsable validator response");
            return Decision::silent();
        }
    };

    let approved = data.get("decision").and_then(Value::as_str) == Some("approve");
    let mut parts: Vec<String> = Vec::new();

    if !approved {
        let stop_reason = data
            .get("stopReason")
            .and_then(Value::as_str)
            .unwrap_or("TDD validation failed");
        parts.push(format!("🛑 {stop_reason}"));
    }
    if let Some(reason) = data.get("reason").and_then(Value::as_str) {
        if !reason.is_empty() {
            parts.push(reason.to_string());
        }
    }
    if let Some(validation) = data.get("validationResults") {
        if let Some(phase) = validation.get("tddPhase").and_then(Value::as_str) {
            parts.push(format!("🔄 TDD Phase: {phase}"));
        }
        if let Some(coverage) = validation.get("testCoverage") {
            parts.push(format!("📊 Coverage: {coverage}%"));
        }
    }
    if !approved {
        if let Some(suggestions) = data.get("suggestions").and_then(Value::as_array) {
            if !suggestions.is_empty() {
                parts.push("💡 Suggestions:".to_string());
                for suggestion in suggestions.iter().take(3) {
                    if let Some(text) = suggestion.as_str() {
                        parts.push(format!("  • {text}"));
                    }
                }
            }
        }
    }

    Decision {
        proceed: approved,
        message: parts.join("\n"),
    }
}

#[async_trait]
impl Hook for GateHook {
    fn name(&self) -> &str {
        "tdd_guard"
    }

    fn is_applicable(&self, event: &HookEvent) -> bool {
        self.config.enabled
            && event.event_type == EventType::PreToolUse
            && GATED_TOOLS.contains(&event.tool_name.as_str())
    }

    async fn process_event(&self, event: &HookEvent) -> Result<Decision, HookError> {
        if !self.is_applicable(event) {
            return Ok(Decision::silent());
        }

        let mut metadata = HashMap::new();
        metadata.insert("operation".to_string(), json!("tdd_validation"));
        metadata.insert("tool".to_string(), json!(event.tool_name));
        let permit = self
            .ctx
            .pool
            .acquire(
                &self.config.resource_pool,
                metadata,
                Some(Duration::from_secs(self.config.permit_wait_seconds)),
            )
            .await;
        if !permit.acquired() {
            return Ok(Decision::allow("⚠ TDD validation skipped (resource limit)"));
        }

        Ok(self.validate(event).await)
    }

    fn config_schema(&self) -> serde_json::Value {
        let mut schema = base_config_schema();
        if let Some(properties) = schema
            .get_mut("properties")
            .and_then(|p| p.as_object_mut())
        {
            properties.insert(
                "strict_mode".to_string(),
                json!({
                    "type": "boolean",
                    "description": "Block the operation when validation times out",
                    "default": false,
                }),
            );
            properties.insert(
                "model".to_string(),
                json!({
                    "type": "string",
                    "description": "Model the validator runs with",
                    "default": "claude",
                }),
            );
            properties.insert(
                "test_runner".to_string(),
                json!({
                    "type": "string",
                    "enum": ["pytest", "unittest", "vitest", "jest"],
                    "default": "pytest",
                }),
            );
            properties.insert(
                "timeout".to_string(),
                json!({
                    "type": "integer",
                    "description": "Validation timeout in seconds",
                    "minimum": 5,
                }),
            );
            properties.insert(
                "resource_pool".to_string(),
                json!({
                    "type": "string",
                    "default": "validation",
                }),
            );
        }
        schema
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
