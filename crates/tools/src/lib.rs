// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-tools: external tool discovery and invocation.
//!
//! The probe decides, once at startup, whether each external tool (the
//! validation CLI, the documentation MCP server, the fix agent) can be
//! invoked and in what form. The transport layer then talks to a probed
//! tool over plain subprocess, stdio JSON-RPC, or HTTP JSON-RPC.

pub mod probe;
pub mod rpc;
pub mod subprocess;
pub mod transport;

pub use probe::{
    Candidate, Invocation, ToolCatalog, ToolKind, ToolSpec, ToolStatus, Transport,
};
pub use subprocess::{run_with_stdin, run_with_timeout, stderr_tail, ExecError};
pub use transport::{invoke, TransportError};
