// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hook capability set and shared collaborators.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use warden_core::{Clock, Decision, HookEvent, ProcessTimeouts};
use warden_pool::PoolManager;
use warden_tools::{ToolCatalog, TransportError};

/// Errors escaping a hook's `process_event`.
///
/// Hooks normally translate failures into fail-open decisions themselves;
/// whatever escapes is caught by the dispatcher and converted per the
/// hook's `fail_open` policy.
#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Internal(String),
}

/// Collaborators handed to every hook at construction.
#[derive(Clone)]
pub struct HookContext {
    pub pool: Arc<PoolManager>,
    pub tools: Arc<ToolCatalog>,
    pub timeouts: ProcessTimeouts,
    pub clock: Arc<dyn Clock>,
}

/// One pluggable pipeline stage.
///
/// Implementations must not assume state from other hooks; the dispatcher
/// shares nothing mutable between them.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Stable name, used in registry lookups and failure messages.
    fn name(&self) -> &str;

    /// Whether this hook wants to see the event at all.
    fn is_applicable(&self, event: &HookEvent) -> bool;

    /// Process one event into a decision.
    async fn process_event(&self, event: &HookEvent) -> Result<Decision, HookError>;

    /// JSON schema describing valid configuration for this hook.
    fn config_schema(&self) -> serde_json::Value;

    /// Release owned resources at dispatcher shutdown.
    async fn cleanup(&self) {}

    /// Whether an escaped failure should still allow the operation.
    fn fail_open(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for dyn Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook").field("name", &self.name()).finish()
    }
}

/// The base schema every hook shares; hooks extend `properties`.
pub fn base_config_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "enabled": {
                "type": "boolean",
                "description": "Whether this hook is enabled",
                "default": true,
            }
        }
    })
}
