// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC 2.0 envelope builders for MCP-style tools.

use serde_json::{json, Value};

/// MCP protocol version spoken during the stdio handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Client identity advertised in `initialize`.
pub const CLIENT_NAME: &str = "warden";

/// A request envelope with an id.
pub fn request(method: &str, params: Value, id: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": id,
    })
}

/// A notification envelope (no id, no response expected).
pub fn notification(method: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": {},
    })
}

/// The `initialize` request opening a stdio session (id 0).
pub fn initialize() -> Value {
    request(
        "initialize",
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "roots": {"listChanged": true},
                "sampling": {},
            },
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
        }),
        0,
    )
}

/// A `tools/call` request for a named tool.
pub fn tool_call(name: &str, arguments: Value, id: u64) -> Value {
    request(
        "tools/call",
        json!({
            "name": name,
            "arguments": arguments,
        }),
        id,
    )
}

/// Extract `result.content[0].text` from a tool-call response.
pub fn first_content_text(response: &Value) -> Option<&str> {
    response
        .get("result")?
        .get("content")?
        .as_array()?
        .first()?
        .get("text")?
        .as_str()
}
