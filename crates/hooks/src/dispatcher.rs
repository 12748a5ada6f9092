// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event dispatch across the hook pipeline.
//!
//! Hooks run sequentially in registry order, each under its own wall-clock
//! budget. The final decision is the logical AND of every hook's decision,
//! with messages joined by newlines. A hook failure is converted to a
//! fail-open annotation naming the hook, unless the hook opted into
//! fail-closed.

use crate::hook::Hook;
use std::time::Duration;
use tracing::{debug, warn};
use warden_core::{Decision, HookEvent, Response};

/// Default per-hook wall-clock budget, distinct from any pool timeout.
pub const DEFAULT_HOOK_BUDGET: Duration = Duration::from_secs(120);

pub struct Dispatcher {
    hooks: Vec<Box<dyn Hook>>,
    hook_budget: Duration,
}

impl Dispatcher {
    pub fn new(hooks: Vec<Box<dyn Hook>>) -> Self {
        Self::with_budget(hooks, DEFAULT_HOOK_BUDGET)
    }

    pub fn with_budget(hooks: Vec<Box<dyn Hook>>, hook_budget: Duration) -> Self {
        Self { hooks, hook_budget }
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Run one event through every applicable hook and aggregate.
    ///
    /// Never fails: whatever happens inside the hooks, the host gets a
    /// well-formed response envelope.
    pub async fn dispatch(&self, event: &HookEvent) -> Response {
        let mut decisions = Vec::new();

        for hook in &self.hooks {
            if !hook.is_applicable(event) {
                continue;
            }
            debug!(hook = hook.name(), tool = %event.tool_name, "running hook");

            let decision =
                match tokio::time::timeout(self.hook_budget, hook.process_event(event)).await {
                    Ok(Ok(decision)) => decision,
                    Ok(Err(e)) => self.convert_failure(hook.as_ref(), e.to_string()),
                    Err(_elapsed) => self.convert_failure(
                        hook.as_ref(),
                        format!("timed out after {}s", self.hook_budget.as_secs()),
                    ),
                };
            decisions.push(decision);
        }

        let aggregate = Decision::aggregate(decisions);
        Response::new(aggregate.proceed, aggregate.message)
    }

    fn convert_failure(&self, hook: &dyn Hook, reason: String) -> Decision {
        warn!(hook = hook.name(), reason, "hook failed");
        let message = format!("{} failed: {}", hook.name(), reason);
        if hook.fail_open() {
            Decision::allow(message)
        } else {
            Decision::block(message)
        }
    }

    /// Invoke every hook's cleanup at shutdown.
    pub async fn shutdown(&self) {
        for hook in &self.hooks {
            hook.cleanup().await;
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
