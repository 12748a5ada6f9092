// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event envelope delivered by the coding-assistant host.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle phase of the tool event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    PreToolUse,
    PostToolUse,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::PreToolUse => write!(f, "PreToolUse"),
            EventType::PostToolUse => write!(f, "PostToolUse"),
        }
    }
}

/// Parameters of the tool invocation the event describes.
///
/// Only the fields hooks care about are named; everything else the host
/// sends is preserved in `extra` so the envelope round-trips.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_string: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// One tool event as delivered on stdin.
///
/// Unknown top-level fields are ignored; missing optional fields default per
/// hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookEvent {
    pub event_type: EventType,
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: ToolInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl HookEvent {
    /// File path of the tool invocation, if any.
    pub fn file_path(&self) -> Option<&str> {
        self.tool_input.file_path.as_deref()
    }

    /// Timestamp from the host metadata, if present.
    pub fn timestamp(&self) -> Option<&serde_json::Value> {
        self.metadata.get("timestamp")
    }
}

/// Response envelope written to stdout, one per dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "continue")]
    pub proceed: bool,
    pub reasoning: String,
}

impl Response {
    pub fn new(proceed: bool, reasoning: impl Into<String>) -> Self {
        Self {
            proceed,
            reasoning: reasoning.into(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
