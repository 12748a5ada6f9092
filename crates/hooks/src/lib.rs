// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-hooks: the hook pipeline.
//!
//! A hook observes one tool event and may annotate or veto it. The registry
//! names the hooks an installation runs; the loader instantiates them with
//! their config and shared collaborators; the dispatcher feeds each event
//! through the applicable hooks in registry order and folds their decisions
//! into one response.
//!
//! Three hooks ship in-tree: a post-edit linter with an auto-fix loop, a
//! pre-edit documentation enhancer backed by an MCP server, and a pre-edit
//! validation gate around an external TDD validator.

pub mod config;
pub mod dispatcher;
pub mod docs;
pub mod gate;
pub mod hook;
pub mod lint;
pub mod registry;

pub use dispatcher::Dispatcher;
pub use docs::DocsHook;
pub use gate::GateHook;
pub use hook::{Hook, HookContext, HookError};
pub use lint::LintHook;
pub use registry::{HookLoader, LoaderError, Registry, RegistryEntry};
