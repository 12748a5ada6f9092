// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized subprocess deadlines.
//!
//! Every external process Warden spawns gets its wall-clock budget from
//! here, so operators can tune them with environment variables instead of
//! per-hook config.

use std::time::Duration;

/// Default timeout for the validation CLI (seconds).
const DEFAULT_TDD_GUARD_SECS: u64 = 300;
/// Default timeout for tool availability probes (seconds).
const DEFAULT_EXTERNAL_CHECK_SECS: u64 = 30;
/// Default timeout for MCP server round-trips (seconds).
const DEFAULT_MCP_CALL_SECS: u64 = 20;
/// Default base timeout for fix-agent calls (seconds).
const DEFAULT_FIX_AGENT_SECS: u64 = 300;
/// Default timeout for package-manager installs (seconds).
const DEFAULT_NPM_INSTALL_SECS: u64 = 300;
/// Default timeout for a single linter run (seconds).
const DEFAULT_LINTER_SECS: u64 = 60;

/// Wall-clock budgets for external processes, read once from the
/// environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessTimeouts {
    pub tdd_guard: Duration,
    pub external_check: Duration,
    pub mcp_call: Duration,
    pub fix_agent: Duration,
    pub npm_install: Duration,
    pub linter: Duration,
}

impl Default for ProcessTimeouts {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ProcessTimeouts {
    /// Load budgets from the environment, falling back to defaults for
    /// unset or unparsable values.
    pub fn from_env() -> Self {
        Self {
            tdd_guard: env_secs("TDD_GUARD_TIMEOUT_SECONDS", DEFAULT_TDD_GUARD_SECS),
            external_check: env_secs(
                "EXTERNAL_TOOL_CHECK_TIMEOUT_SECONDS",
                DEFAULT_EXTERNAL_CHECK_SECS,
            ),
            mcp_call: env_secs("MCP_CALL_TIMEOUT_SECONDS", DEFAULT_MCP_CALL_SECS),
            fix_agent: env_secs("CLAUDE_AGENT_TIMEOUT_SECONDS", DEFAULT_FIX_AGENT_SECS),
            npm_install: env_secs("NPM_INSTALL_TIMEOUT_SECONDS", DEFAULT_NPM_INSTALL_SECS),
            linter: env_secs("LINTER_PROCESS_TIMEOUT_SECONDS", DEFAULT_LINTER_SECS),
        }
    }

    /// Fix-agent deadline scaled by issue complexity and clamped.
    ///
    /// `complexity` is a multiplier derived from the size of the linter
    /// report; the result stays within `[min, max]`.
    pub fn for_fix_agent(&self, complexity: f64, min: Duration, max: Duration) -> Duration {
        let scaled = self.fix_agent.as_secs_f64() * complexity;
        Duration::from_secs_f64(scaled.clamp(min.as_secs_f64(), max.as_secs_f64()))
    }
}

fn env_secs(var: &str, default: u64) -> Duration {
    let secs = std::env::var(var)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

#[cfg(test)]
#[path = "timeouts_tests.rs"]
mod tests;
